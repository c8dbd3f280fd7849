use std::time::Duration;
use url::Url;

pub const DEFAULT_SERVICE: &str = "https://public.api.bsky.app/";
pub const DEFAULT_DEPTH: u16 = 6;
pub const DEFAULT_PARENT_HEIGHT: u16 = 80;
pub const DEFAULT_SCROLL_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct Config {
    /// Base url of the AppView the xrpc queries go to.
    pub service: Url,
    /// How many levels of replies to fetch below the focal post.
    pub depth: u16,
    /// How many ancestors to fetch above the focal post.
    pub parent_height: u16,
    /// Wait before scrolling the focal post into view, so the list has laid out.
    pub scroll_delay: Duration,
}

impl Config {
    pub fn with_service(mut self, service: &str) -> Result<Self, url::ParseError> {
        let mut service = Url::parse(service)?;
        // so that joining "xrpc/..." appends instead of replacing the last segment
        if !service.path().ends_with('/') {
            let path = format!("{}/", service.path());
            service.set_path(&path);
        }
        self.service = service;
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: Url::parse(DEFAULT_SERVICE).expect("default service url is valid"),
            depth: DEFAULT_DEPTH,
            parent_height: DEFAULT_PARENT_HEIGHT,
            scroll_delay: DEFAULT_SCROLL_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = Config::default();
        assert_eq!(config.service.as_str(), "https://public.api.bsky.app/");
        assert_eq!(config.depth, 6);
        assert_eq!(config.parent_height, 80);
        assert_eq!(config.scroll_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_with_service_appends_slash() {
        let config = Config::default()
            .with_service("https://example.com/api")
            .unwrap();
        assert_eq!(config.service.as_str(), "https://example.com/api/");
        assert!(Config::default().with_service("not a url").is_err());
    }
}
