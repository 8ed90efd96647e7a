//! Deletion predicates: when does an idle room get reclaimed?

use std::fmt;
use std::sync::Arc;

use vestibule_gateway::Occupant;

/// Everything a deletion predicate may inspect.
///
/// The lifecycle engine builds one of these right after a member leaves
/// a room, from a freshly fetched occupancy snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DeletionContext<'a> {
    /// Whether the member who just left is the room's owner.
    pub owner_leaving: bool,
    /// Whether the owner is gone, on this event or an earlier one.
    pub orphaned: bool,
    /// Who is still connected, after the departure.
    pub occupants: &'a [Occupant],
}

/// One vote on whether a room should be deleted.
///
/// Predicates compose by AND: a room is reclaimed only when every
/// applicable predicate holds. An entry channel with no predicates at
/// all never reclaims rooms.
#[derive(Clone)]
pub enum DeletionPredicate {
    /// Holds when the room is empty, or when the owner is gone and only
    /// bots remain.
    WhenEmpty,

    /// Holds when every remaining occupant is a bot, vacuously so for
    /// an empty room. Useful where a music bot lingers after the humans
    /// leave.
    AllBots,

    /// An arbitrary predicate over the [`DeletionContext`].
    Custom(Arc<dyn Fn(&DeletionContext<'_>) -> bool + Send + Sync>),
}

impl DeletionPredicate {
    /// Wraps an arbitrary predicate function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&DeletionContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Evaluates this predicate against one departure.
    pub fn holds(&self, ctx: &DeletionContext<'_>) -> bool {
        match self {
            Self::WhenEmpty => {
                ctx.occupants.is_empty()
                    || (ctx.orphaned && ctx.occupants.iter().all(|o| o.bot))
            }
            Self::AllBots => ctx.occupants.iter().all(|o| o.bot),
            Self::Custom(f) => f(ctx),
        }
    }
}

impl fmt::Debug for DeletionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WhenEmpty => f.write_str("WhenEmpty"),
            Self::AllBots => f.write_str("AllBots"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// The deletion behavior attached to one entry channel.
///
/// Wraps an ordered list of predicates that are ANDed together at
/// evaluation time, alongside whatever global predicates the registry
/// holds.
#[derive(Debug, Clone)]
pub struct DeletionPolicy {
    predicates: Vec<DeletionPredicate>,
}

impl DeletionPolicy {
    /// Reclaim rooms as soon as [`DeletionPredicate::WhenEmpty`] holds.
    /// This is the default.
    pub fn when_empty() -> Self {
        Self {
            predicates: vec![DeletionPredicate::WhenEmpty],
        }
    }

    /// Never reclaim automatically; rooms stay until removed by hand or
    /// deleted out of band. Must be chosen explicitly: an accidental
    /// empty predicate list is treated as a configuration mistake
    /// elsewhere.
    pub fn keep_forever() -> Self {
        Self { predicates: vec![] }
    }

    /// Builds a policy from an explicit predicate list.
    pub fn from_predicates(predicates: Vec<DeletionPredicate>) -> Self {
        Self { predicates }
    }

    /// Appends another predicate to the AND set.
    pub fn and(mut self, predicate: DeletionPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// The predicates this policy contributes to evaluation.
    pub fn predicates(&self) -> &[DeletionPredicate] {
        &self.predicates
    }

    /// Returns `true` when this policy contributes no predicates.
    pub fn is_keep_forever(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl Default for DeletionPolicy {
    fn default() -> Self {
        Self::when_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vestibule_gateway::MemberId;

    fn human(id: &str) -> Occupant {
        Occupant {
            member_id: MemberId::new(id),
            bot: false,
        }
    }

    fn bot(id: &str) -> Occupant {
        Occupant {
            member_id: MemberId::new(id),
            bot: true,
        }
    }

    fn ctx<'a>(
        owner_leaving: bool,
        orphaned: bool,
        occupants: &'a [Occupant],
    ) -> DeletionContext<'a> {
        DeletionContext {
            owner_leaving,
            orphaned,
            occupants,
        }
    }

    #[test]
    fn test_when_empty_holds_for_empty_room() {
        assert!(DeletionPredicate::WhenEmpty.holds(&ctx(true, true, &[])));
        assert!(DeletionPredicate::WhenEmpty.holds(&ctx(false, false, &[])));
    }

    #[test]
    fn test_when_empty_ignores_leftover_bots_once_orphaned() {
        let occupants = [bot("b1"), bot("b2")];
        assert!(DeletionPredicate::WhenEmpty.holds(&ctx(true, true, &occupants)));
    }

    #[test]
    fn test_when_empty_keeps_room_with_humans() {
        let occupants = [human("h1")];
        assert!(!DeletionPredicate::WhenEmpty.holds(&ctx(true, true, &occupants)));
    }

    #[test]
    fn test_when_empty_keeps_bots_while_owner_present() {
        // Owner still around somewhere: bots alone do not justify deletion.
        let occupants = [bot("b1")];
        assert!(!DeletionPredicate::WhenEmpty.holds(&ctx(false, false, &occupants)));
    }

    #[test]
    fn test_all_bots_holds_for_bots_only() {
        let occupants = [bot("b1"), bot("b2")];
        assert!(DeletionPredicate::AllBots.holds(&ctx(false, false, &occupants)));
    }

    #[test]
    fn test_all_bots_vacuous_for_empty_room() {
        assert!(DeletionPredicate::AllBots.holds(&ctx(false, false, &[])));
    }

    #[test]
    fn test_all_bots_fails_with_a_human_present() {
        let occupants = [bot("b1"), human("h1")];
        assert!(!DeletionPredicate::AllBots.holds(&ctx(false, false, &occupants)));
    }

    #[test]
    fn test_custom_predicate_sees_the_context() {
        let only_on_owner_exit = DeletionPredicate::custom(|ctx| ctx.owner_leaving);
        assert!(only_on_owner_exit.holds(&ctx(true, true, &[])));
        assert!(!only_on_owner_exit.holds(&ctx(false, false, &[])));
    }

    #[test]
    fn test_policy_default_is_when_empty() {
        let policy = DeletionPolicy::default();
        assert_eq!(policy.predicates().len(), 1);
        assert!(!policy.is_keep_forever());
    }

    #[test]
    fn test_keep_forever_has_no_predicates() {
        let policy = DeletionPolicy::keep_forever();
        assert!(policy.predicates().is_empty());
        assert!(policy.is_keep_forever());
    }

    #[test]
    fn test_and_appends_in_order() {
        let policy = DeletionPolicy::when_empty().and(DeletionPredicate::AllBots);
        assert_eq!(policy.predicates().len(), 2);
    }
}
