//! Navigation adapter - projections over the `navigation` collection.
//!
//! Navigation records are hierarchical (parents embed their children), so
//! the generic CRUD surface is not enough: the site also queries flat
//! parent lists, flat child lists with a `parentId` injected, and lookups
//! by slug. This stays a thin read adapter, not a second CRUD
//! implementation.

use serde_json::{json, Value};

use crate::error::CrudError;
use crate::record::RecordId;
use crate::store::DocumentStore;
use crate::crud::CollectionCrudService;

pub struct NavigationView<'a, S> {
    service: &'a CollectionCrudService<S>,
}

impl<'a, S: DocumentStore> NavigationView<'a, S> {
    pub fn new(service: &'a CollectionCrudService<S>) -> Self {
        NavigationView { service }
    }

    /// The full tree: parents with their embedded children.
    pub fn all_with_children(&self) -> Result<Vec<Value>, CrudError> {
        self.service.list("navigation")
    }

    /// Parents only, projected to `{id, title, slug, position}`.
    pub fn parents(&self) -> Result<Vec<Value>, CrudError> {
        let parents = self
            .all_with_children()?
            .iter()
            .map(|nav| {
                json!({
                    "id": nav.get("id").cloned().unwrap_or(Value::Null),
                    "title": nav.get("title").cloned().unwrap_or(Value::Null),
                    "slug": nav.get("slug").cloned().unwrap_or(Value::Null),
                    "position": nav.get("position").cloned().unwrap_or(Value::Null),
                })
            })
            .collect();
        Ok(parents)
    }

    /// One parent by id, with its children.
    pub fn parent_by_id(&self, id: &RecordId) -> Result<Value, CrudError> {
        self.service.get("navigation", id)
    }

    /// One parent by slug, with its children.
    pub fn parent_by_slug(&self, slug: &str) -> Result<Value, CrudError> {
        self.all_with_children()?
            .into_iter()
            .find(|nav| nav.get("slug").and_then(Value::as_str) == Some(slug))
            .ok_or_else(|| CrudError::NotFound {
                collection: "navigation".to_string(),
                id: slug.to_string(),
            })
    }

    /// Every child across all parents, each stamped with its `parentId`.
    pub fn children(&self) -> Result<Vec<Value>, CrudError> {
        let mut all = Vec::new();
        for parent in self.all_with_children()? {
            let parent_id = parent.get("id").cloned().unwrap_or(Value::Null);
            let Some(children) = parent.get("children").and_then(Value::as_array) else {
                continue;
            };
            for child in children {
                let mut flat = child.clone();
                if let Some(obj) = flat.as_object_mut() {
                    obj.insert("parentId".to_string(), parent_id.clone());
                }
                all.push(flat);
            }
        }
        Ok(all)
    }

    /// One flattened child by id.
    pub fn child_by_id(&self, id: &RecordId) -> Result<Value, CrudError> {
        self.children()?
            .into_iter()
            .find(|child| id.matches(child))
            .ok_or_else(|| CrudError::NotFound {
                collection: "child-navs".to_string(),
                id: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDocumentStore;
    use serde_json::json;

    fn nav_service() -> CollectionCrudService<InMemoryDocumentStore> {
        let doc = serde_json::from_value(json!({
            "navigation": [
                {
                    "id": 1,
                    "title": "Sản phẩm",
                    "slug": "san-pham",
                    "position": 1,
                    "children": [
                        { "id": 10, "title": "Rau củ", "slug": "rau-cu" },
                        { "id": 11, "title": "Trái cây", "slug": "trai-cay" }
                    ]
                },
                {
                    "id": 2,
                    "title": "Dịch vụ",
                    "slug": "dich-vu",
                    "position": 2,
                    "children": [
                        { "id": 20, "title": "Ẩm thực", "slug": "am-thuc" }
                    ]
                }
            ]
        }))
        .unwrap();
        CollectionCrudService::new(InMemoryDocumentStore::new(doc))
    }

    #[test]
    fn parents_are_projected_without_children() {
        let svc = nav_service();
        let view = NavigationView::new(&svc);
        let parents = view.parents().unwrap();
        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0]["title"], json!("Sản phẩm"));
        assert!(parents[0].get("children").is_none());
    }

    #[test]
    fn children_are_flattened_with_parent_id() {
        let svc = nav_service();
        let view = NavigationView::new(&svc);
        let children = view.children().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0]["parentId"], json!(1));
        assert_eq!(children[2]["parentId"], json!(2));
    }

    #[test]
    fn parent_lookup_by_slug() {
        let svc = nav_service();
        let view = NavigationView::new(&svc);
        let parent = view.parent_by_slug("dich-vu").unwrap();
        assert_eq!(parent["id"], json!(2));

        let err = view.parent_by_slug("khong-co").unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn child_lookup_by_id() {
        let svc = nav_service();
        let view = NavigationView::new(&svc);
        let child = view.child_by_id(&RecordId::parse("11")).unwrap();
        assert_eq!(child["slug"], json!("trai-cay"));
        assert_eq!(child["parentId"], json!(1));
    }

    #[test]
    fn empty_navigation_yields_empty_views() {
        let svc = CollectionCrudService::new(InMemoryDocumentStore::default());
        let view = NavigationView::new(&svc);
        assert!(view.parents().unwrap().is_empty());
        assert!(view.children().unwrap().is_empty());
    }
}
