use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::EventLifecycleEvent;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig, Page};
use engine_logging::{engine_debug, engine_trace};
use futures_util::{Stream, StreamExt};
use harvest_core::ImageElement;
use tokio::task::JoinHandle;

use crate::fetch::BROWSER_USER_AGENT;

/// Collects `src`/`srcset` of every `<img>` in the current DOM.
const IMAGE_ELEMENTS_SCRIPT: &str = "Array.prototype.map.call(document.querySelectorAll('img'), \
     function (img) { return { src: img.getAttribute('src'), srcset: img.getAttribute('srcset') }; })";
const GROW_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";
const LIFECYCLE_INIT: &str = "init";
const LIFECYCLE_NETWORK_IDLE: &str = "networkIdle";

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("failed to open {url}: {message}")]
    Navigation { url: String, message: String },
    #[error("page evaluation failed: {0}")]
    Evaluate(String),
    #[error("page already closed")]
    Closed,
    #[error("failed to shut down browser: {0}")]
    Shutdown(String),
}

/// The rendered-page capabilities the harvester needs.
#[async_trait::async_trait]
pub trait PageDriver: Send {
    /// Open `url` and wait until its content is loaded.
    async fn navigate(&mut self, url: &str) -> Result<(), PageError>;
    /// Raw attributes of every image element currently in the page.
    async fn image_elements(&mut self) -> Result<Vec<ImageElement>, PageError>;
    /// Ask the page to load more content.
    async fn grow(&mut self) -> Result<(), PageError>;
    /// Give asynchronous content time to arrive.
    async fn settle(&mut self, duration: Duration);
    /// Release the renderer. Safe to call more than once.
    async fn close(&mut self) -> Result<(), PageError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    /// Pause after the DOM is ready so the first batch can hydrate.
    pub initial_settle: Duration,
    /// Upper bound on the best-effort wait for the network to go quiet.
    pub network_idle_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 2000,
            user_agent: BROWSER_USER_AGENT.to_string(),
            initial_settle: Duration::from_millis(1500),
            network_idle_timeout: Duration::from_secs(10),
        }
    }
}

/// Headless (or visible) Chromium tab driven over CDP.
pub struct ChromiumPage {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    settings: BrowserSettings,
}

impl ChromiumPage {
    pub async fn launch(settings: BrowserSettings) -> Result<Self, PageError> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.viewport_width, settings.viewport_height)
            .viewport(Viewport {
                width: settings.viewport_width,
                height: settings.viewport_height,
                ..Viewport::default()
            });
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(PageError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| PageError::Launch(err.to_string()))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    engine_trace!("browser handler: {}", err);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| PageError::Launch(err.to_string()))?;
        page.set_user_agent(SetUserAgentOverrideParams::new(settings.user_agent.clone()))
            .await
            .map_err(|err| PageError::Launch(err.to_string()))?;

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
            settings,
        })
    }

    fn page(&self) -> Result<Page, PageError> {
        self.page.clone().ok_or(PageError::Closed)
    }
}

async fn run_script(page: Page, script: &str) -> Result<Option<serde_json::Value>, PageError> {
    let params = EvaluateParams::builder()
        .expression(script)
        .return_by_value(true)
        .build()
        .map_err(PageError::Evaluate)?;
    let result = page
        .evaluate_expression(params)
        .await
        .map_err(|err| PageError::Evaluate(err.to_string()))?;
    Ok(result.value().cloned())
}

/// Consume `(frame_id, lifecycle_name)` signals until `frame` goes network
/// idle after its navigation started, or `limit` elapses. With no known
/// frame, any frame counts. Returns whether idle was observed.
async fn wait_for_network_idle<S>(signals: S, frame: Option<&str>, limit: Duration) -> bool
where
    S: Stream<Item = (String, String)>,
{
    let mut signals = std::pin::pin!(signals);
    let watch = async {
        let mut navigation_started = false;
        while let Some((frame_id, name)) = signals.next().await {
            if frame.is_some_and(|main| main != frame_id) {
                continue;
            }
            match name.as_str() {
                LIFECYCLE_INIT => navigation_started = true,
                LIFECYCLE_NETWORK_IDLE if navigation_started => return true,
                _ => {}
            }
        }
        false
    };
    tokio::time::timeout(limit, watch).await.unwrap_or(false)
}

#[async_trait::async_trait]
impl PageDriver for ChromiumPage {
    async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        let page = self.page()?;
        let idle_timeout = self.settings.network_idle_timeout;
        let navigation_error = |message: String| PageError::Navigation {
            url: url.to_string(),
            message,
        };

        // Subscribe first; events fired during the load stay buffered.
        let lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|err| navigation_error(err.to_string()))?;
        page.goto(url)
            .await
            .map_err(|err| navigation_error(err.to_string()))?;
        let main_frame = page
            .mainframe()
            .await
            .ok()
            .flatten()
            .map(|frame| frame.inner().clone());
        tokio::time::sleep(self.settings.initial_settle).await;

        // Network quiescence is best effort; a busy page is not a failure.
        let signals = lifecycle.map(|event| (event.frame_id.inner().clone(), event.name.clone()));
        if !wait_for_network_idle(signals, main_frame.as_deref(), idle_timeout).await {
            engine_debug!("network did not settle within {:?}", idle_timeout);
        }
        Ok(())
    }

    async fn image_elements(&mut self) -> Result<Vec<ImageElement>, PageError> {
        match run_script(self.page()?, IMAGE_ELEMENTS_SCRIPT).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|err| PageError::Evaluate(err.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn grow(&mut self) -> Result<(), PageError> {
        run_script(self.page()?, GROW_SCRIPT).await?;
        Ok(())
    }

    async fn settle(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn close(&mut self) -> Result<(), PageError> {
        self.page = None;
        if let Some(mut browser) = self.browser.take() {
            browser
                .close()
                .await
                .map_err(|err| PageError::Shutdown(err.to_string()))?;
            let _ = browser.wait().await;
        }
        if let Some(task) = self.handler_task.take() {
            let _ = task.await;
        }
        Ok(())
    }
}
