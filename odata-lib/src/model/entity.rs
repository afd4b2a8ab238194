//! Typed entity binding

/// Binds a Rust type to an entity type of the service schema.
///
/// The type name is resolved against metadata when a command is formatted,
/// so it only has to match the schema's name under the session's
/// name-match policy.
///
/// # Example
///
/// ```
/// use odata_lib::model::ODataEntity;
///
/// struct Product;
///
/// impl ODataEntity for Product {
///     const TYPE_NAME: &'static str = "Product";
/// }
/// ```
pub trait ODataEntity {
    /// Entity type name (or entity set name) in the service schema.
    const TYPE_NAME: &'static str;
}
