//! Identifier registry: stable integer ids for every node of a menu tree.
//!
//! Ids are assigned depth-first, pre-order, from a single counter starting at
//! 1, so sibling subtrees never restart numbering. The registry does not own
//! items; it remembers where each id lives in the host's tree and resolves
//! against whatever tree it is handed.

use std::collections::HashMap;

use systray_protocol::{Menu, MenuItem};

use crate::error::TrayError;

/// Position of an item: child indices from the menu root.
type ItemPath = Vec<usize>;

#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    paths: HashMap<u32, ItemPath>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns ids to `items` and all their submenus, replacing any previous
    /// registration. Returns the number of registered items.
    pub fn register(&mut self, items: &mut [MenuItem]) -> usize {
        self.paths.clear();
        let mut next = 1;
        let mut prefix = Vec::new();
        assign(items, &mut prefix, &mut next, &mut self.paths);
        self.paths.len()
    }

    /// Looks up the item registered under `id` in `menu`.
    ///
    /// Fails with [`TrayError::UnknownIdentifier`] when the id was never
    /// registered or no longer exists in the tree.
    pub fn resolve<'m>(&self, menu: &'m Menu, id: u32) -> Result<&'m MenuItem, TrayError> {
        let path = self.paths.get(&id).ok_or(TrayError::UnknownIdentifier(id))?;
        match at_path(&menu.items, path) {
            Some(item) if item.identifier() == Some(id) => Ok(item),
            // The host replaced or reordered the tree; fall back to a search.
            _ => menu.find(id).ok_or(TrayError::UnknownIdentifier(id)),
        }
    }

    #[cfg(test)]
    fn contains(&self, id: u32) -> bool {
        self.paths.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

fn assign(
    items: &mut [MenuItem],
    prefix: &mut Vec<usize>,
    next: &mut u32,
    paths: &mut HashMap<u32, ItemPath>,
) {
    for (index, item) in items.iter_mut().enumerate() {
        prefix.push(index);
        item.set_identifier(*next);
        paths.insert(*next, prefix.clone());
        *next += 1;
        if let Some(children) = item.items.as_deref_mut() {
            assign(children, prefix, next, paths);
        }
        prefix.pop();
    }
}

fn at_path<'m>(items: &'m [MenuItem], path: &[usize]) -> Option<&'m MenuItem> {
    let (first, rest) = path.split_first()?;
    let item = items.get(*first)?;
    if rest.is_empty() {
        Some(item)
    } else {
        at_path(item.children(), rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_menu() -> Menu {
        Menu {
            title: "Title".into(),
            items: vec![
                MenuItem::new("A", ""),
                MenuItem::new("B", "").with_items(vec![
                    MenuItem::new("C", ""),
                    MenuItem::new("D", ""),
                ]),
                MenuItem::new("E", ""),
            ],
            ..Menu::default()
        }
    }

    fn ids(items: &[MenuItem], out: &mut Vec<(String, u32)>) {
        for item in items {
            out.push((item.title.clone(), item.identifier().unwrap()));
            ids(item.children(), out);
        }
    }

    #[test]
    fn assigns_depth_first_preorder() {
        let mut menu = sample_menu();
        let mut registry = IdentifierRegistry::new();
        assert_eq!(registry.register(&mut menu.items), 5);

        let mut seen = Vec::new();
        ids(&menu.items, &mut seen);
        let expected: Vec<(String, u32)> = [("A", 1), ("B", 2), ("C", 3), ("D", 4), ("E", 5)]
            .into_iter()
            .map(|(t, id)| (t.to_string(), id))
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn resolves_nested_items() {
        let mut menu = sample_menu();
        let mut registry = IdentifierRegistry::new();
        registry.register(&mut menu.items);

        assert_eq!(registry.resolve(&menu, 4).unwrap().title, "D");
        assert_eq!(registry.resolve(&menu, 5).unwrap().title, "E");
        assert!(registry.contains(3));
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let mut menu = sample_menu();
        let mut registry = IdentifierRegistry::new();
        registry.register(&mut menu.items);

        assert!(matches!(
            registry.resolve(&menu, 99),
            Err(TrayError::UnknownIdentifier(99))
        ));
    }

    #[test]
    fn reregistering_rebuilds_instead_of_accumulating() {
        let mut menu = sample_menu();
        let mut registry = IdentifierRegistry::new();
        registry.register(&mut menu.items);
        menu.items.truncate(1);

        assert_eq!(registry.register(&mut menu.items), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(menu.items[0].identifier(), Some(1));
    }

    #[test]
    fn field_mutation_keeps_identifier() {
        let mut menu = sample_menu();
        let mut registry = IdentifierRegistry::new();
        registry.register(&mut menu.items);

        menu.items[0].title = "A renamed".into();
        menu.items[0].checked = Some(true);
        let item = registry.resolve(&menu, 1).unwrap();
        assert_eq!(item.title, "A renamed");
        assert_eq!(item.identifier(), Some(1));
    }

    #[test]
    fn moved_item_is_found_by_search() {
        let mut menu = sample_menu();
        let mut registry = IdentifierRegistry::new();
        registry.register(&mut menu.items);

        menu.items.swap(0, 2);
        assert_eq!(registry.resolve(&menu, 1).unwrap().title, "A");
        assert_eq!(registry.resolve(&menu, 5).unwrap().title, "E");
    }

    #[test]
    fn removed_item_becomes_unknown() {
        let mut menu = sample_menu();
        let mut registry = IdentifierRegistry::new();
        registry.register(&mut menu.items);

        menu.items.remove(0);
        assert!(registry.resolve(&menu, 1).is_err());
    }

    #[test]
    fn clear_forgets_everything() {
        let mut menu = sample_menu();
        let mut registry = IdentifierRegistry::new();
        registry.register(&mut menu.items);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.resolve(&menu, 1).is_err());
    }
}
