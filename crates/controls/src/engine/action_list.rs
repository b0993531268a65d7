use indexmap::{IndexMap, map::Entry};

/// An action waiting to be applied to a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PendingAction {
    /// Index of the rule that produced the action.
    pub rule: usize,
    pub priority: f64,
    pub value: f64,
    pub modulated: bool,
}

/// At most one pending action per link, rebuilt every step.
///
/// Links are kept in the order their first action arrived.
#[derive(Debug, Clone, Default)]
pub(super) struct ActionList {
    pending: IndexMap<usize, PendingAction>,
}

impl ActionList {
    pub(super) fn clear(&mut self) {
        self.pending.clear();
    }

    /// Offers an action for `link`.
    ///
    /// The action is kept if the link has none yet or if it outranks the one
    /// already there. Returns whether it was kept.
    pub(super) fn offer(&mut self, link: usize, action: PendingAction) -> bool {
        match self.pending.entry(link) {
            Entry::Vacant(entry) => {
                entry.insert(action);
                true
            }
            Entry::Occupied(mut entry) if action.priority > entry.get().priority => {
                entry.insert(action);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (usize, &PendingAction)> {
        self.pending.iter().map(|(&link, action)| (link, action))
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(rule: usize, priority: f64, value: f64) -> PendingAction {
        PendingAction {
            rule,
            priority,
            value,
            modulated: false,
        }
    }

    #[test]
    fn higher_priority_replaces() {
        let mut list = ActionList::default();
        assert!(list.offer(3, pending(0, 1.0, 0.0)));
        assert!(list.offer(3, pending(1, 5.0, 1.0)));
        assert!(!list.offer(3, pending(2, 2.0, 0.5)));

        let (link, kept) = list.iter().next().unwrap();
        assert_eq!(link, 3);
        assert_eq!(kept.rule, 1);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn ties_keep_the_first_action() {
        let mut list = ActionList::default();
        list.offer(0, pending(0, 2.0, 1.0));
        assert!(!list.offer(0, pending(1, 2.0, 0.0)));
        assert_eq!(list.iter().next().unwrap().1.rule, 0);
    }

    #[test]
    fn links_stay_in_first_seen_order() {
        let mut list = ActionList::default();
        list.offer(4, pending(0, 0.0, 1.0));
        list.offer(1, pending(0, 0.0, 1.0));
        list.offer(4, pending(1, 9.0, 0.0));

        let links: Vec<_> = list.iter().map(|(link, _)| link).collect();
        assert_eq!(links, [4, 1]);

        list.clear();
        assert_eq!(list.len(), 0);
    }
}
