//! Automated key extraction through a WebDriver-controlled Chrome session.
//!
//! Every failure here is non-fatal: it is logged and reported as "no key",
//! leaving the manual path to take over. Only an operator cancellation during
//! the login pause escapes as an error.
#![cfg_attr(not(feature = "browser"), allow(dead_code, unused_imports))]

use crate::config::BrowserConfig;
use crate::display::{print_info, print_success, print_warning};
use crate::error::SupakeyError;
use crate::input::Prompter;
use crate::validation::looks_like_key;
use std::sync::Mutex;

/// Where the dashboard renders the anon key, most specific first.
pub const KEY_SELECTORS: &[&str] = &[
    "[data-testid*='anon']",
    "[data-testid*='api-key']",
    "code",
    "pre",
    ".api-key",
    ".anon-key",
];

/// Extra selectors worth inspecting by hand; not queryable as CSS.
pub const MANUAL_ONLY_SELECTORS: &[&str] = &["table tr:has-text('anon')"];

/// The dashboard bounced us to its sign-in flow.
pub fn is_login_url(url: &str) -> bool {
    url.contains("login") || url.contains("auth")
}

/// First key-shaped text, by selector order then DOM order.
pub fn first_matching_key<G>(groups: impl IntoIterator<Item = G>) -> Option<String>
where
    G: IntoIterator<Item = String>,
{
    groups.into_iter().find_map(|texts| {
        texts
            .into_iter()
            .map(|text| text.trim().to_string())
            .find(|text| looks_like_key(text))
    })
}

/// Try to scrape the anon key off the dashboard.
pub fn try_extract(
    config: &BrowserConfig,
    dashboard_url: &str,
    prompter: &mut dyn Prompter,
) -> Result<Option<String>, SupakeyError> {
    match session::extract(config, dashboard_url, prompter) {
        Ok(Some(key)) => {
            print_success("Found API key automatically!");
            Ok(Some(key))
        }
        Ok(None) => {
            print_warning("❌ Could not find API key automatically");
            Ok(None)
        }
        Err(SupakeyError::Cancelled) => Err(SupakeyError::Cancelled),
        Err(e) => {
            print_warning(&format!("❌ Automated extraction failed: {}", e));
            Ok(None)
        }
    }
}

fn pause_for_login(prompter: &mut dyn Prompter) -> Result<(), SupakeyError> {
    print_info("🔐 Login required. Please log in manually...");
    prompter.read_line("Press Enter after you've logged in and are on the API settings page...")?;
    Ok(())
}

/// Holds the live WebDriver session so an interrupt can still close it.
pub(crate) struct SessionSlot<T> {
    slot: Mutex<Option<T>>,
}

impl<T> SessionSlot<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub(crate) fn register(&self, session: T) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session);
    }

    /// Hand the session to exactly one closer.
    pub(crate) fn take(&self) -> Option<T> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Quit a session left open by an interrupted extraction.
pub async fn close_active_session() {
    session::close_active().await;
}

#[cfg(feature = "browser")]
mod session {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;
    use thirtyfour::prelude::*;

    const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

    static ACTIVE: SessionSlot<WebDriver> = SessionSlot::new();

    pub fn extract(
        config: &BrowserConfig,
        dashboard_url: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<Option<String>, SupakeyError> {
        print_info("🤖 Attempting automated extraction with WebDriver...");

        let executor = Executor::new()?;
        let driver = executor.block_on(start(config.clone()))?;
        ACTIVE.register(driver.clone());

        let result = drive(&executor, &driver, config, dashboard_url, prompter);
        drop(driver);

        // Always close the session, even when extraction failed
        if let Some(driver) = ACTIVE.take()
            && let Err(e) = executor.block_on(quit(driver))
        {
            tracing::debug!("{}", e);
        }

        result
    }

    pub async fn close_active() {
        if let Some(driver) = ACTIVE.take()
            && let Err(e) = quit(driver).await
        {
            tracing::debug!("{}", e);
        }
    }

    fn drive(
        executor: &Executor,
        driver: &WebDriver,
        config: &BrowserConfig,
        dashboard_url: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<Option<String>, SupakeyError> {
        let current_url = executor.block_on(navigate(
            driver.clone(),
            dashboard_url.to_string(),
            config.settle,
        ))?;
        print_info(&format!("🌐 Navigated to: {}", dashboard_url));

        if is_login_url(&current_url) {
            pause_for_login(prompter)?;
        }

        let groups = executor.block_on(collect_texts(driver.clone()))?;
        Ok(first_matching_key(groups))
    }

    async fn quit(driver: WebDriver) -> Result<(), SupakeyError> {
        driver
            .quit()
            .await
            .map_err(|e| SupakeyError::Browser(format!("Failed to quit browser: {}", e)))
    }

    async fn start(config: BrowserConfig) -> Result<WebDriver, SupakeyError> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in config.chrome_args() {
            caps.add_arg(&arg).map_err(|e| {
                SupakeyError::Browser(format!("Failed to add arg '{}': {}", arg, e))
            })?;
        }

        let driver = WebDriver::new(&config.webdriver_url, caps)
            .await
            .map_err(|e| {
                SupakeyError::Browser(format!(
                    "Failed to start browser via {} (is chromedriver running?): {}",
                    config.webdriver_url, e
                ))
            })?;

        driver
            .set_page_load_timeout(PAGE_LOAD_TIMEOUT)
            .await
            .map_err(|e| SupakeyError::Browser(format!("Failed to set page load timeout: {}", e)))?;

        Ok(driver)
    }

    async fn navigate(
        driver: WebDriver,
        url: String,
        settle: Duration,
    ) -> Result<String, SupakeyError> {
        driver
            .goto(&url)
            .await
            .map_err(|e| SupakeyError::Browser(format!("Navigation failed: {}", e)))?;

        // The settings page renders its keys client-side
        tokio::time::sleep(settle).await;

        driver
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| SupakeyError::Browser(format!("Failed to get URL: {}", e)))
    }

    async fn collect_texts(driver: WebDriver) -> Result<Vec<Vec<String>>, SupakeyError> {
        let mut groups = Vec::with_capacity(KEY_SELECTORS.len());

        for selector in KEY_SELECTORS {
            let elements = match driver.find_all(By::Css(*selector)).await {
                Ok(elements) => elements,
                Err(e) => {
                    tracing::debug!("Selector '{}' failed: {}", selector, e);
                    groups.push(Vec::new());
                    continue;
                }
            };

            let mut texts = Vec::with_capacity(elements.len());
            for element in elements {
                if let Ok(text) = element.text().await {
                    texts.push(text);
                }
            }
            tracing::debug!("Selector '{}' matched {} element(s)", selector, texts.len());
            groups.push(texts);
        }

        Ok(groups)
    }

    /// Runs the session's futures from synchronous code. Inside the app's
    /// runtime they are spawned onto it; otherwise one runtime is owned for
    /// the whole extraction so the WebDriver client never outlives it.
    enum Executor {
        Shared(tokio::runtime::Handle),
        Owned(tokio::runtime::Runtime),
    }

    impl Executor {
        fn new() -> Result<Self, SupakeyError> {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                return Ok(Executor::Shared(handle));
            }
            tokio::runtime::Runtime::new()
                .map(Executor::Owned)
                .map_err(|e| {
                    SupakeyError::Browser(format!("Failed to create async runtime: {}", e))
                })
        }

        fn block_on<T, F>(&self, future: F) -> Result<T, SupakeyError>
        where
            T: Send + 'static,
            F: std::future::Future<Output = Result<T, SupakeyError>> + Send + 'static,
        {
            match self {
                Executor::Shared(handle) => {
                    let (tx, rx) = mpsc::channel();
                    handle.spawn(async move {
                        let _ = tx.send(future.await);
                    });

                    match rx.recv() {
                        Ok(result) => result,
                        Err(e) => Err(SupakeyError::Browser(format!(
                            "Failed to receive result from async task: {}",
                            e
                        ))),
                    }
                }
                Executor::Owned(runtime) => runtime.block_on(future),
            }
        }
    }

}

#[cfg(not(feature = "browser"))]
mod session {
    use super::*;

    pub fn extract(
        _config: &BrowserConfig,
        _dashboard_url: &str,
        _prompter: &mut dyn Prompter,
    ) -> Result<Option<String>, SupakeyError> {
        print_warning(
            "⚠️ Browser automation not available. Rebuild with: cargo install supakey --features browser",
        );
        Ok(None)
    }

    pub async fn close_active() {}
}
