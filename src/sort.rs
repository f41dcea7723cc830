use crate::errors::SortErrorKind;

/// Entry that can be placed by [`sort_triple`].
pub trait Sortable {
    fn key(&self) -> &str;

    /// Whether `self` must come after `other`.
    fn runs_after(&self, other: &Self) -> bool;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    ToSort,
    Sorting,
    Sorted,
}

/// Stable dependency sort: items keep their input order unless a relation forces otherwise.
///
/// # Errors
/// Returns [`SortErrorKind::Cycle`] with the offending chain if the relation has a cycle.
pub fn sort_triple<T: Sortable>(items: Vec<T>) -> Result<Vec<T>, SortErrorKind> {
    let mut marks = vec![Mark::ToSort; items.len()];
    let mut order = Vec::with_capacity(items.len());
    let mut chain = Vec::new();

    for index in 0..items.len() {
        visit(&items, index, &mut marks, &mut order, &mut chain)?;
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|index| slots[index].take()).collect())
}

fn visit<T: Sortable>(
    items: &[T],
    index: usize,
    marks: &mut [Mark],
    order: &mut Vec<usize>,
    chain: &mut Vec<usize>,
) -> Result<(), SortErrorKind> {
    match marks[index] {
        Mark::Sorted => return Ok(()),
        Mark::Sorting => {
            let start = chain.iter().position(|&pos| pos == index).unwrap_or(0);
            let mut cycle = chain[start..].iter().map(|&pos| items[pos].key().to_owned()).collect::<Vec<_>>();
            cycle.push(items[index].key().to_owned());
            return Err(SortErrorKind::Cycle { chain: cycle });
        }
        Mark::ToSort => {}
    }

    marks[index] = Mark::Sorting;
    chain.push(index);

    for before in 0..items.len() {
        if before != index && items[index].runs_after(&items[before]) {
            visit(items, before, marks, order, chain)?;
        }
    }

    chain.pop();
    marks[index] = Mark::Sorted;
    order.push(index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{sort_triple, Sortable};
    use crate::errors::SortErrorKind;

    #[derive(Debug)]
    struct Item {
        key: &'static str,
        after: &'static [&'static str],
    }

    impl Sortable for Item {
        fn key(&self) -> &str {
            self.key
        }

        fn runs_after(&self, other: &Self) -> bool {
            self.after.contains(&other.key)
        }
    }

    fn keys(items: &[Item]) -> Vec<&'static str> {
        items.iter().map(|item| item.key).collect()
    }

    #[test]
    fn test_keeps_input_order() {
        let sorted = sort_triple(vec![
            Item { key: "a", after: &[] },
            Item { key: "b", after: &[] },
            Item { key: "c", after: &[] },
        ])
        .unwrap();

        assert_eq!(keys(&sorted), ["a", "b", "c"]);
    }

    #[test]
    fn test_relation_wins_over_input_order() {
        let sorted = sort_triple(vec![
            Item { key: "a", after: &["c"] },
            Item { key: "b", after: &[] },
            Item { key: "c", after: &["b"] },
        ])
        .unwrap();

        assert_eq!(keys(&sorted), ["b", "c", "a"]);
    }

    #[test]
    fn test_cycle() {
        let err = sort_triple(vec![
            Item { key: "a", after: &["b"] },
            Item { key: "b", after: &["c"] },
            Item { key: "c", after: &["a"] },
            Item { key: "d", after: &[] },
        ])
        .unwrap_err();

        let SortErrorKind::Cycle { chain } = err;
        assert_eq!(chain, ["a", "b", "c", "a"]);
    }
}
