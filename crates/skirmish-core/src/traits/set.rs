//! Per-actor trait storage.
//!
//! A [`TraitSet`] keeps instances in declaration order and builds its
//! capability indexes once, when the set is created. Dispatch walks those
//! indexes and never inspects types at runtime.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::traits::{Capability, TraitComponent, TraitInfo, TraitInstance, TraitKey, TraitKind};

/// Shared access to one typed trait instance.
pub struct TraitRef<'a, T: TraitComponent> {
    key: &'a TraitKey,
    info: &'a T::Info,
    state: &'a T,
}

impl<'a, T: TraitComponent> TraitRef<'a, T> {
    fn from_instance(instance: &'a TraitInstance) -> Option<Self> {
        Some(Self {
            key: &instance.key,
            info: T::info_of(&instance.info)?,
            state: T::from_state(&instance.state)?,
        })
    }

    /// The instance's key.
    pub const fn key(&self) -> &'a TraitKey {
        self.key
    }

    /// The instance's qualifier, if any.
    pub fn qualifier(&self) -> Option<&'a str> {
        self.key.qualifier.as_deref()
    }

    /// The shared configuration.
    pub const fn info(&self) -> &'a T::Info {
        self.info
    }

    /// The instance's state.
    pub const fn state(&self) -> &'a T {
        self.state
    }
}

/// Exclusive access to one typed trait instance.
pub struct TraitMut<'a, T: TraitComponent> {
    key: &'a TraitKey,
    info: &'a T::Info,
    state: &'a mut T,
}

impl<'a, T: TraitComponent> TraitMut<'a, T> {
    fn from_instance(instance: &'a mut TraitInstance) -> Option<Self> {
        let TraitInstance { key, info, state } = instance;
        Some(Self {
            key,
            info: T::info_of(&**info)?,
            state: T::from_state_mut(state)?,
        })
    }

    /// The instance's key.
    pub const fn key(&self) -> &'a TraitKey {
        self.key
    }

    /// The instance's qualifier, if any.
    pub fn qualifier(&self) -> Option<&'a str> {
        self.key.qualifier.as_deref()
    }

    /// The shared configuration. Outlives this handle's borrow of the state.
    pub const fn info(&self) -> &'a T::Info {
        self.info
    }

    /// The instance's state.
    pub const fn state(&self) -> &T {
        &*self.state
    }

    /// The instance's state, mutably.
    pub const fn state_mut(&mut self) -> &mut T {
        &mut *self.state
    }
}

/// The ordered trait instances of one actor.
#[derive(Debug, Clone, Default)]
pub struct TraitSet {
    instances: Vec<TraitInstance>,
    by_key: BTreeMap<TraitKey, usize>,
    by_kind: BTreeMap<TraitKind, Vec<usize>>,
    issuers: Vec<usize>,
    resolvers: Vec<usize>,
    tickers: Vec<usize>,
}

impl TraitSet {
    /// Append an instance. Keys are unique; the registry guarantees this.
    pub(crate) fn push(&mut self, key: TraitKey, info: Arc<TraitInfo>) {
        let idx = self.instances.len();
        let kind = key.kind;
        self.by_key.insert(key.clone(), idx);
        self.by_kind.entry(kind).or_default().push(idx);
        if kind.has_capability(Capability::IssueOrder) {
            self.issuers.push(idx);
        }
        if kind.has_capability(Capability::ResolveOrder) {
            self.resolvers.push(idx);
        }
        if kind.has_capability(Capability::Tick) {
            self.tickers.push(idx);
        }
        self.instances.push(TraitInstance::new(key, info));
    }

    /// Number of instances.
    pub const fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the set holds no instances.
    pub const fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// All instances in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TraitInstance> {
        self.instances.iter()
    }

    /// The instance stored under `key`.
    pub fn instance(&self, key: &TraitKey) -> Option<&TraitInstance> {
        self.by_key.get(key).and_then(|&idx| self.instances.get(idx))
    }

    pub(crate) fn instance_mut(&mut self, key: &TraitKey) -> Option<&mut TraitInstance> {
        let idx = *self.by_key.get(key)?;
        self.instances.get_mut(idx)
    }

    /// Whether any instance of `T` is present.
    pub fn has<T: TraitComponent>(&self) -> bool {
        self.by_kind.contains_key(&T::KIND)
    }

    /// Number of instances of `T`.
    pub fn count<T: TraitComponent>(&self) -> usize {
        self.by_kind.get(&T::KIND).map_or(0, Vec::len)
    }

    /// The unqualified instance of `T`, or the first one declared.
    pub fn get<T: TraitComponent>(&self) -> Option<TraitRef<'_, T>> {
        let idx = self.primary_index(T::KIND)?;
        self.instances.get(idx).and_then(TraitRef::from_instance)
    }

    /// Mutable twin of [`TraitSet::get`].
    pub fn get_mut<T: TraitComponent>(&mut self) -> Option<TraitMut<'_, T>> {
        let idx = self.primary_index(T::KIND)?;
        self.instances.get_mut(idx).and_then(TraitMut::from_instance)
    }

    /// The instance of `T` with `qualifier`.
    pub fn get_qualified<T: TraitComponent>(&self, qualifier: &str) -> Option<TraitRef<'_, T>> {
        self.instance(&TraitKey::qualified(T::KIND, qualifier))
            .and_then(TraitRef::from_instance)
    }

    /// Mutable twin of [`TraitSet::get_qualified`].
    pub fn get_qualified_mut<T: TraitComponent>(
        &mut self,
        qualifier: &str,
    ) -> Option<TraitMut<'_, T>> {
        self.instance_mut(&TraitKey::qualified(T::KIND, qualifier))
            .and_then(TraitMut::from_instance)
    }

    /// Every instance of `T`, in declaration order.
    pub fn all<T: TraitComponent>(&self) -> impl Iterator<Item = TraitRef<'_, T>> {
        self.instances.iter().filter_map(TraitRef::from_instance)
    }

    /// Mutable twin of [`TraitSet::all`].
    pub fn all_mut<T: TraitComponent>(&mut self) -> impl Iterator<Item = TraitMut<'_, T>> {
        self.instances.iter_mut().filter_map(TraitMut::from_instance)
    }

    /// Issue-capable instances, in declaration order.
    pub(crate) fn issuers(&self) -> impl Iterator<Item = &TraitInstance> {
        self.issuers.iter().filter_map(|&idx| self.instances.get(idx))
    }

    /// Keys of the resolve-capable instances whose verb set includes `verb`.
    pub(crate) fn resolvers_for(&self, verb: &str) -> Vec<TraitKey> {
        self.resolvers
            .iter()
            .filter_map(|&idx| self.instances.get(idx))
            .filter(|instance| instance.info.resolves(verb))
            .map(|instance| instance.key.clone())
            .collect()
    }

    /// Run every tick-capable instance once.
    pub(crate) fn tick(&mut self) {
        for &idx in &self.tickers {
            if let Some(instance) = self.instances.get_mut(idx) {
                instance.tick();
            }
        }
    }

    fn primary_index(&self, kind: TraitKind) -> Option<usize> {
        let indices = self.by_kind.get(&kind)?;
        indices
            .iter()
            .copied()
            .find(|&idx| {
                self.instances
                    .get(idx)
                    .is_some_and(|instance| instance.key.qualifier.is_none())
            })
            .or_else(|| indices.first().copied())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::traits::{AmmoPool, AmmoPoolInfo, Health, HealthInfo, Highlight, HighlightInfo, Mobile, MobileInfo};

    fn set_with(decls: Vec<(TraitKey, TraitInfo)>) -> TraitSet {
        let mut set = TraitSet::default();
        for (key, info) in decls {
            set.push(key, Arc::new(info));
        }
        set
    }

    const fn pool(capacity: u32) -> TraitInfo {
        TraitInfo::AmmoPool(AmmoPoolInfo {
            capacity,
            reload_ticks: 1,
        })
    }

    #[test]
    fn get_prefers_unqualified_instance() {
        let set = set_with(vec![
            (TraitKey::qualified(TraitKind::AmmoPool, "a"), pool(1)),
            (TraitKey::unqualified(TraitKind::AmmoPool), pool(5)),
        ]);
        let primary = set.get::<AmmoPool>().unwrap();
        assert_eq!(primary.info().capacity, 5);
        assert_eq!(primary.qualifier(), None);
    }

    #[test]
    fn get_falls_back_to_first_declared() {
        let set = set_with(vec![
            (TraitKey::qualified(TraitKind::AmmoPool, "a"), pool(1)),
            (TraitKey::qualified(TraitKind::AmmoPool, "b"), pool(2)),
        ]);
        assert_eq!(set.get::<AmmoPool>().unwrap().qualifier(), Some("a"));
        assert_eq!(set.get_qualified::<AmmoPool>("b").unwrap().info().capacity, 2);
        assert!(set.get_qualified::<AmmoPool>("c").is_none());
        assert_eq!(set.count::<AmmoPool>(), 2);
    }

    #[test]
    fn qualified_instances_are_independent() {
        let mut set = set_with(vec![
            (TraitKey::qualified(TraitKind::AmmoPool, "a"), pool(3)),
            (TraitKey::qualified(TraitKind::AmmoPool, "b"), pool(3)),
        ]);
        assert!(set.get_qualified_mut::<AmmoPool>("a").unwrap().state_mut().take_one());

        let ammo: Vec<u32> = set.all::<AmmoPool>().map(|p| p.state().ammo()).collect();
        assert_eq!(ammo, vec![2, 3]);
    }

    #[test]
    fn all_mut_mutates_every_instance_with_its_own_info() {
        let mut set = set_with(vec![
            (TraitKey::qualified(TraitKind::AmmoPool, "a"), pool(2)),
            (TraitKey::unqualified(TraitKind::Mobile), TraitInfo::Mobile(MobileInfo::default())),
            (TraitKey::qualified(TraitKind::AmmoPool, "b"), pool(4)),
        ]);
        for mut ammo in set.all_mut::<AmmoPool>() {
            while ammo.state_mut().take_one() {}
            let info = ammo.info();
            ammo.state_mut().reload_one(info);
        }

        let pools: Vec<(Option<&str>, u32)> = set
            .all::<AmmoPool>()
            .map(|p| (p.qualifier(), p.state().ammo()))
            .collect();
        assert_eq!(pools, vec![(Some("a"), 1), (Some("b"), 1)]);
    }

    #[test]
    fn typed_lookup_ignores_other_kinds() {
        let set = set_with(vec![
            (TraitKey::unqualified(TraitKind::Mobile), TraitInfo::Mobile(MobileInfo::default())),
            (TraitKey::unqualified(TraitKind::Health), TraitInfo::Health(HealthInfo { max_hp: 40 })),
        ]);
        assert!(set.has::<Mobile>());
        assert!(!set.has::<AmmoPool>());
        assert_eq!(set.get::<Health>().unwrap().state().hp(), 40);
        assert_eq!(set.all::<AmmoPool>().count(), 0);
    }

    #[test]
    fn capability_indexes_follow_declaration_order() {
        let set = set_with(vec![
            (TraitKey::unqualified(TraitKind::Health), TraitInfo::Health(HealthInfo::default())),
            (
                TraitKey::qualified(TraitKind::Highlight, "LIGHTS"),
                TraitInfo::Highlight(HighlightInfo::default()),
            ),
            (TraitKey::unqualified(TraitKind::Mobile), TraitInfo::Mobile(MobileInfo::default())),
        ]);
        let issuers: Vec<TraitKind> = set.issuers().map(TraitInstance::kind).collect();
        assert_eq!(issuers, vec![TraitKind::Mobile]);

        let enter = set.resolvers_for("Enter");
        assert_eq!(enter, vec![TraitKey::qualified(TraitKind::Highlight, "LIGHTS")]);
        let moves = set.resolvers_for("Move");
        assert_eq!(moves, vec![TraitKey::unqualified(TraitKind::Mobile)]);
    }

    #[test]
    fn tick_runs_tickers_only() {
        let mut set = set_with(vec![(
            TraitKey::unqualified(TraitKind::Highlight),
            TraitInfo::Highlight(HighlightInfo {
                verbs: vec!["Enter".to_owned()],
                duration_ticks: 2,
            }),
        )]);
        {
            let mut flash = set.get_mut::<Highlight>().unwrap();
            let info = flash.info();
            flash.state_mut().trigger(info);
        }
        set.tick();
        assert!(set.get::<Highlight>().unwrap().state().is_flashing());
        set.tick();
        assert!(!set.get::<Highlight>().unwrap().state().is_flashing());
    }
}
