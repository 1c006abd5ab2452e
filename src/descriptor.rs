//! Field descriptor tables.
//!
//! A descriptor table lists, in output order, every field a view exposes and
//! what kind of canonical value backs it. Tables are plain `static` data so a
//! new view is a new table (or a new wrapping over an existing one), never new
//! mapping code.

use std::borrow::Cow;

use crate::case::to_canonical;

/// JSON type of a scalar's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Text,
    Flag,
}

impl Primitive {
    /// JSON Schema type name.
    pub fn schema_type(&self) -> &'static str {
        match self {
            Primitive::Text => "string",
            Primitive::Flag => "boolean",
        }
    }
}

/// Which side of the related-profiles record a relation field reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Manager,
    Directs,
}

impl Relation {
    /// Key in the related-profiles record.
    pub fn key(&self) -> &'static str {
        match self {
            Relation::Manager => "manager",
            Relation::Directs => "directs",
        }
    }
}

/// Kind of canonical value behind a view field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// `{value, metadata: {display}}`.
    Scalar(Primitive),
    /// `{values: [..]}`.
    List,
    /// `{values: {key: value}, metadata: {display}}`.
    KeyedList,
    /// Fixed set of sub-fields, each with its own wrapper.
    Group(&'static [FieldDescriptor]),
    /// Manager or direct reports from the related-profiles record.
    Relation(Relation),
}

impl Kind {
    /// Short name for logs and listings.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Scalar(_) => "scalar",
            Kind::List => "list",
            Kind::KeyedList => "keyed-list",
            Kind::Group(_) => "group",
            Kind::Relation(_) => "relation",
        }
    }
}

/// One exposed field of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name in the view (`camelCase`).
    pub view_name: &'static str,
    /// Canonical name when it is not derivable from `view_name`.
    pub canonical_override: Option<&'static str>,
    pub kind: Kind,
}

impl FieldDescriptor {
    pub const fn new(view_name: &'static str, kind: Kind) -> Self {
        Self {
            view_name,
            canonical_override: None,
            kind,
        }
    }

    pub const fn text(view_name: &'static str) -> Self {
        Self::new(view_name, Kind::Scalar(Primitive::Text))
    }

    pub const fn flag(view_name: &'static str) -> Self {
        Self::new(view_name, Kind::Scalar(Primitive::Flag))
    }

    pub const fn list(view_name: &'static str) -> Self {
        Self::new(view_name, Kind::List)
    }

    pub const fn keyed(view_name: &'static str) -> Self {
        Self::new(view_name, Kind::KeyedList)
    }

    pub const fn group(view_name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self::new(view_name, Kind::Group(fields))
    }

    pub const fn relation(view_name: &'static str, relation: Relation) -> Self {
        Self::new(view_name, Kind::Relation(relation))
    }

    /// Read the canonical value from an explicit name instead of the derived one.
    pub const fn from_canonical(mut self, name: &'static str) -> Self {
        self.canonical_override = Some(name);
        self
    }

    /// Canonical field name backing this view field.
    pub fn canonical_name(&self) -> Cow<'static, str> {
        match self.canonical_override {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(to_canonical(self.view_name)),
        }
    }

    /// Whether updates may write this field.
    pub fn is_writable(&self) -> bool {
        !matches!(self.kind, Kind::Relation(_))
    }
}

/// Staff attributes grouped under `staffInformation`.
pub const STAFF_INFORMATION: &[FieldDescriptor] = &[
    FieldDescriptor::flag("staff"),
    FieldDescriptor::text("title"),
    FieldDescriptor::text("team"),
    FieldDescriptor::text("costCenter"),
    FieldDescriptor::text("workerType"),
    FieldDescriptor::text("primaryWorkEmail"),
    FieldDescriptor::text("wprDeskNumber"),
    FieldDescriptor::text("officeLocation"),
];

/// Access groups grouped under `accessInformation`.
pub const ACCESS_INFORMATION: &[FieldDescriptor] = &[FieldDescriptor::keyed("mozilliansorg")];

/// Every profile field, including organizational relations.
pub static PROFILE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::text("loginMethod"),
    FieldDescriptor::flag("active"),
    FieldDescriptor::text("lastModified"),
    FieldDescriptor::text("created"),
    FieldDescriptor::keyed("usernames"),
    FieldDescriptor::text("firstName"),
    FieldDescriptor::text("lastName"),
    FieldDescriptor::text("primaryEmail"),
    FieldDescriptor::keyed("sshPublicKeys"),
    FieldDescriptor::keyed("pgpPublicKeys"),
    FieldDescriptor::group("accessInformation", ACCESS_INFORMATION),
    FieldDescriptor::text("funTitle"),
    FieldDescriptor::text("description"),
    FieldDescriptor::text("location"),
    FieldDescriptor::text("timezone"),
    FieldDescriptor::list("languages"),
    FieldDescriptor::list("tags"),
    FieldDescriptor::text("pronouns"),
    FieldDescriptor::text("picture"),
    FieldDescriptor::keyed("uris"),
    FieldDescriptor::keyed("phoneNumbers"),
    FieldDescriptor::text("alternativeName"),
    FieldDescriptor::relation("manager", Relation::Manager),
    FieldDescriptor::relation("directs", Relation::Directs),
    FieldDescriptor::group("staffInformation", STAFF_INFORMATION),
];

/// Profile fields a client may edit (no relations).
pub static EDITABLE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::text("loginMethod"),
    FieldDescriptor::flag("active"),
    FieldDescriptor::text("lastModified"),
    FieldDescriptor::text("created"),
    FieldDescriptor::keyed("usernames"),
    FieldDescriptor::text("firstName"),
    FieldDescriptor::text("lastName"),
    FieldDescriptor::text("primaryEmail"),
    FieldDescriptor::keyed("sshPublicKeys"),
    FieldDescriptor::keyed("pgpPublicKeys"),
    FieldDescriptor::group("accessInformation", ACCESS_INFORMATION),
    FieldDescriptor::text("funTitle"),
    FieldDescriptor::text("description"),
    FieldDescriptor::text("location"),
    FieldDescriptor::text("timezone"),
    FieldDescriptor::list("languages"),
    FieldDescriptor::list("tags"),
    FieldDescriptor::text("pronouns"),
    FieldDescriptor::text("picture"),
    FieldDescriptor::keyed("uris"),
    FieldDescriptor::keyed("phoneNumbers"),
    FieldDescriptor::text("alternativeName"),
    FieldDescriptor::group("staffInformation", STAFF_INFORMATION),
];

/// Find a descriptor by view name.
pub fn find<'a>(fields: &'a [FieldDescriptor], view_name: &str) -> Option<&'a FieldDescriptor> {
    fields.iter().find(|f| f.view_name == view_name)
}

/// Visit every descriptor in a table, descending into groups.
pub fn walk(fields: &[FieldDescriptor], visit: &mut impl FnMut(&FieldDescriptor)) {
    for field in fields {
        visit(field);
        if let Kind::Group(inner) = field.kind {
            walk(inner, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_canonical_names() {
        let f = find(PROFILE_FIELDS, "phoneNumbers").unwrap();
        assert_eq!(f.canonical_name(), "phone_numbers");

        let f = FieldDescriptor::text("dinoId").from_canonical("identities");
        assert_eq!(f.canonical_name(), "identities");
    }

    #[test]
    fn editable_fields_are_profile_fields_without_relations() {
        let expected: Vec<_> = PROFILE_FIELDS.iter().filter(|f| f.is_writable()).collect();
        let actual: Vec<_> = EDITABLE_FIELDS.iter().collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn walk_descends_into_groups() {
        let mut names = Vec::new();
        walk(EDITABLE_FIELDS, &mut |f| names.push(f.view_name));
        assert!(names.contains(&"costCenter"));
        assert!(names.contains(&"mozilliansorg"));
        assert_eq!(names.len(), EDITABLE_FIELDS.len() + 9);
    }

    #[test]
    fn relations_are_read_only() {
        let manager = find(PROFILE_FIELDS, "manager").unwrap();
        assert!(!manager.is_writable());
        assert_eq!(manager.kind.name(), "relation");
    }
}
