/// File name for a captured page: lower-cased `hostname + path` with every
/// `/` replaced by `_`, then `_<unix timestamp>.html`.
///
/// ```
/// use docsift_web::naming::capture_filename;
///
/// assert_eq!(capture_filename("Example.com", "/A/b", 1000), "example.com_a_b_1000.html");
/// ```
pub fn capture_filename(hostname: &str, path: &str, timestamp: i64) -> String {
    let stem = format!("{hostname}{path}").to_lowercase().replace('/', "_");
    format!("{stem}_{timestamp}.html")
}
