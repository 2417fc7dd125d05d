//! Closed sets of named values with stable numeric ids.

/// A fixed set of values addressable by id or by name.
///
/// Lookups are exact: names are case-sensitive and unknown ids or names
/// yield `None`.
pub trait Enumeration: Copy + Eq + Sized + 'static {
    /// Every member, in id order.
    fn all() -> &'static [Self];

    fn id(&self) -> i32;

    fn name(&self) -> &'static str;

    fn from_id(id: i32) -> Option<Self> {
        Self::all().iter().copied().find(|member| member.id() == id)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|member| member.name() == name)
    }
}
