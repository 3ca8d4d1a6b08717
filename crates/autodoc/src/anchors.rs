//! Anchor registration.
//!
//! Headings produced by a handler are recorded in the cross-reference map.
//! Headings marked with a `data-role` also become inventory objects: the
//! heading itself at [`Priority::Standard`], and every other anchor the
//! object is reachable under (aliases) at [`Priority::Secondary`].

use crate::handler::Handler;
use crate::inventory::{CrossRefs, Inventory, InventoryItem, Priority};
use crate::options::OptionSet;
use crate::tree::Element;

/// Register `headings` rendered by `handler` on `page`.
///
/// Does nothing when the page is unknown.
pub fn register_headings(
    page: Option<&str>,
    handler: &dyn Handler,
    headings: &[Element],
    inventory: &Inventory,
    crossrefs: &CrossRefs,
) {
    let Some(page) = page else {
        return;
    };

    for heading in headings {
        let Some(id) = heading.get("id") else {
            continue;
        };
        crossrefs.register_anchor(page, id);

        let Some(role) = heading.get("data-role") else {
            continue;
        };
        let uri = format!("{page}#{id}");
        inventory.register(InventoryItem {
            name: id.to_owned(),
            domain: handler.domain().to_owned(),
            role: role.to_owned(),
            priority: Priority::Standard,
            uri: uri.clone(),
        });
        register_aliases(handler, id, role, &uri, inventory);
    }
}

/// Register the other anchors of the object documented under `id`.
fn register_aliases(handler: &dyn Handler, id: &str, role: &str, uri: &str, inventory: &Inventory) {
    let options = OptionSet::from_options(handler.fallback_config());
    let item = match handler.collect(id, &options) {
        Ok(item) => item,
        Err(e) => {
            tracing::debug!(
                identifier = id,
                error = %e,
                "Could not collect object for its aliases"
            );
            return;
        }
    };

    for anchor in handler.get_anchors(&item) {
        if inventory.contains(&anchor) {
            continue;
        }
        inventory.register(InventoryItem {
            name: anchor,
            domain: handler.domain().to_owned(),
            role: role.to_owned(),
            priority: Priority::Secondary,
            uri: uri.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    use crate::handler::{CollectionError, CollectorItem, RenderError};

    /// Knows `pkg.Foo`, also reachable as `pkg.sub.Foo`.
    struct Aliased;

    impl Handler for Aliased {
        fn name(&self) -> &str {
            "aliased"
        }

        fn domain(&self) -> &str {
            "py"
        }

        fn collect(
            &self,
            identifier: &str,
            _options: &OptionSet,
        ) -> Result<CollectorItem, CollectionError> {
            if identifier == "pkg.Foo" {
                Ok(Box::new(identifier.to_owned()))
            } else {
                Err(CollectionError::new(format!("unknown object {identifier}")))
            }
        }

        fn render(
            &self,
            _item: &CollectorItem,
            _options: &OptionSet,
        ) -> Result<String, RenderError> {
            Ok(String::new())
        }

        fn get_headings(&self, _item: &CollectorItem, _options: &OptionSet) -> Vec<Element> {
            Vec::new()
        }

        fn get_anchors(&self, _item: &CollectorItem) -> BTreeSet<String> {
            ["pkg.Foo", "pkg.sub.Foo"].into_iter().map(str::to_owned).collect()
        }
    }

    fn heading(id: &str, role: Option<&str>) -> Element {
        let el = Element::new("h2").with_attr("id", id);
        match role {
            Some(role) => el.with_attr("data-role", role),
            None => el,
        }
    }

    #[test]
    fn test_registers_object_and_aliases() {
        let inventory = Inventory::new();
        let crossrefs = CrossRefs::new();
        register_headings(
            Some("api/"),
            &Aliased,
            &[heading("pkg.Foo", Some("class"))],
            &inventory,
            &crossrefs,
        );

        let main = inventory.get("pkg.Foo").unwrap();
        assert_eq!(main.priority, Priority::Standard);
        assert_eq!(main.uri, "api/#pkg.Foo");
        assert_eq!(main.domain, "py");

        let alias = inventory.get("pkg.sub.Foo").unwrap();
        assert_eq!(alias.priority, Priority::Secondary);
        assert_eq!(alias.uri, "api/#pkg.Foo");
        assert_eq!(alias.role, "class");

        assert_eq!(crossrefs.url_for("pkg.Foo").as_deref(), Some("api/#pkg.Foo"));
    }

    #[test]
    fn test_plain_heading_only_crossref() {
        let inventory = Inventory::new();
        let crossrefs = CrossRefs::new();
        register_headings(Some("p/"), &Aliased, &[heading("notes", None)], &inventory, &crossrefs);

        assert!(inventory.is_empty());
        assert_eq!(crossrefs.url_for("notes").as_deref(), Some("p/#notes"));
    }

    #[test]
    fn test_fallback_failure_is_skipped() {
        let inventory = Inventory::new();
        let crossrefs = CrossRefs::new();
        register_headings(
            Some("p/"),
            &Aliased,
            &[heading("pkg.Bar", Some("function"))],
            &inventory,
            &crossrefs,
        );

        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.get("pkg.Bar").unwrap().priority, Priority::Standard);
    }

    #[test]
    fn test_existing_entries_win() {
        let inventory = Inventory::new();
        let crossrefs = CrossRefs::new();
        inventory.register(InventoryItem {
            name: "pkg.sub.Foo".to_owned(),
            domain: "py".to_owned(),
            role: "class".to_owned(),
            priority: Priority::Standard,
            uri: "sub/#pkg.sub.Foo".to_owned(),
        });

        register_headings(
            Some("api/"),
            &Aliased,
            &[heading("pkg.Foo", Some("class"))],
            &inventory,
            &crossrefs,
        );

        let alias = inventory.get("pkg.sub.Foo").unwrap();
        assert_eq!(alias.priority, Priority::Standard);
        assert_eq!(alias.uri, "sub/#pkg.sub.Foo");
    }

    #[test]
    fn test_no_page_skips_everything() {
        let inventory = Inventory::new();
        let crossrefs = CrossRefs::new();
        register_headings(
            None,
            &Aliased,
            &[heading("pkg.Foo", Some("class"))],
            &inventory,
            &crossrefs,
        );
        assert!(inventory.is_empty());
        assert!(crossrefs.is_empty());
    }

    #[test]
    fn test_heading_without_id_is_ignored() {
        let inventory = Inventory::new();
        let crossrefs = CrossRefs::new();
        let no_id = Element::new("h2").with_attr("data-role", "class");
        register_headings(Some("p/"), &Aliased, &[no_id], &inventory, &crossrefs);
        assert!(inventory.is_empty());
        assert!(crossrefs.is_empty());
    }
}
