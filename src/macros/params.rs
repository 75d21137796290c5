/// Build a [`Params`](crate::Params) map from `name => value` pairs.
///
/// ```
/// use driftwood::params;
///
/// let params = params! { "id" => 1, "title" => "Post" };
/// assert_eq!(params.len(), 2);
/// assert!(params.get("id").is_some());
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Params::new()$(.bind($name, $value))+
    };
}
