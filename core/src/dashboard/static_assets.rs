// Embedded page assets

/// Page template; `{{title}}` and `{{options}}` are filled per request
pub const INDEX_TEMPLATE: &str = include_str!("static/index.html");

/// Files served under `/static/`: name, content type, body
const ASSETS: &[(&str, &str, &[u8])] = &[
    (
        "app.js",
        "application/javascript; charset=utf-8",
        include_bytes!("static/app.js"),
    ),
    (
        "styles.css",
        "text/css; charset=utf-8",
        include_bytes!("static/styles.css"),
    ),
];

pub struct Asset {
    pub body: &'static [u8],
    pub content_type: &'static str,
}

pub fn get(path: &str) -> Option<Asset> {
    ASSETS
        .iter()
        .find(|(name, _, _)| *name == path)
        .map(|&(_, content_type, body)| Asset { body, content_type })
}
