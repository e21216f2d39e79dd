//! Playwright browser automation
//!
//! Each page is backed by its own Node.js process running an embedded
//! bridge script. Requests and responses are single-line JSON objects on the
//! child's stdin and stdout:
//!
//! ```text
//! -> {"id":3,"op":"click","selector":"text=Next"}
//! <- {"id":3,"ok":true,"url":"https://.../computers?p=1","value":null}
//! <- {"id":4,"ok":false,"url":"...","kind":"timeout","error":"..."}
//! ```

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{Browser, ElementRef, Page};

/// Node.js side of the bridge
pub const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

const send = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

class NotFound extends Error {
  constructor(message) { super(message); this.name = 'NotFound'; }
}

(async () => {
  const browserType = playwright[process.env.CDB_BROWSER || 'chromium'];
  const browser = await browserType.launch({ headless: process.env.CDB_HEADLESS !== '0' });
  const context = await browser.newContext({
    viewport: {
      width: Number(process.env.CDB_VIEWPORT_WIDTH || 1280),
      height: Number(process.env.CDB_VIEWPORT_HEIGHT || 720),
    },
  });
  context.setDefaultTimeout(Number(process.env.CDB_TIMEOUT_MS || 30000));
  const page = await context.newPage();
  send({ ready: true, url: page.url() });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    const req = JSON.parse(line);
    try {
      let value = null;
      switch (req.op) {
        case 'goto':
          await page.goto(req.url);
          break;
        case 'fill':
          await page.fill(req.selector, req.value);
          break;
        case 'select':
          await page.selectOption(req.selector, req.value);
          break;
        case 'click':
          await page.click(req.selector);
          await page.waitForLoadState();
          break;
        case 'count':
          value = await page.locator(req.selector).count();
          break;
        case 'text': {
          const matches = page.locator(req.selector);
          if (req.index >= await matches.count()) {
            throw new NotFound(`${req.selector} has no element #${req.index}`);
          }
          value = await matches.nth(req.index).innerText();
          break;
        }
        case 'close':
          await browser.close();
          send({ id: req.id, ok: true, url: '' });
          process.exit(0);
        default:
          throw new Error(`unknown op ${req.op}`);
      }
      send({ id: req.id, ok: true, url: page.url(), value });
    } catch (error) {
      const kind = error.name === 'TimeoutError' ? 'timeout'
        : error.name === 'NotFound' ? 'not_found' : 'other';
      send({ id: req.id, ok: false, url: page.url(), kind, error: error.message });
    }
  }
  await browser.close();
})().catch((error) => {
  process.stderr.write(`${error.stack || error}\n`);
  process.exit(1);
});
"#;

/// Time allowed for Node to launch the browser and report ready
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Time allowed for the bridge to exit after SIGTERM
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl FromStr for BrowserKind {
    type Err = E2eError;

    fn from_str(s: &str) -> E2eResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" => Ok(BrowserKind::Webkit),
            other => Err(E2eError::Config(format!("unknown browser: {}", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Engine timeout applied to every action
    pub default_timeout_ms: u64,

    /// Directory holding the `playwright` package (None = `npm root -g`
    /// plus `./node_modules`)
    pub node_path: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            default_timeout_ms: 30_000,
            node_path: None,
        }
    }
}

/// Launches one isolated Playwright page per request
pub struct PlaywrightBrowser {
    config: PlaywrightConfig,
    node_path: OsString,
}

impl PlaywrightBrowser {
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        let node_path = Self::resolve_node_path(&config)?;
        Ok(Self { config, node_path })
    }

    /// Check if Playwright is installed
    pub fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    fn resolve_node_path(config: &PlaywrightConfig) -> E2eResult<OsString> {
        let mut dirs = Vec::new();
        if let Some(dir) = &config.node_path {
            dirs.push(dir.clone());
        }
        dirs.push(std::env::current_dir()?.join("node_modules"));
        match Command::new("npm").args(["root", "-g"]).output() {
            Ok(out) if out.status.success() => {
                let root = String::from_utf8_lossy(&out.stdout).trim().to_string();
                if !root.is_empty() {
                    dirs.push(PathBuf::from(root));
                }
            }
            _ => warn!("npm root -g failed; relying on local node_modules"),
        }
        std::env::join_paths(dirs).map_err(|e| E2eError::Config(format!("NODE_PATH: {}", e)))
    }
}

#[async_trait]
impl Browser for PlaywrightBrowser {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>> {
        let page = PlaywrightPage::launch(&self.config, &self.node_path).await?;
        Ok(Box::new(page))
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    id: u64,
    #[serde(flatten)]
    request: Request<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Goto { url: &'a str },
    Fill { selector: String, value: &'a str },
    Select { selector: String, value: &'a str },
    Click { selector: String },
    Count { selector: String },
    Text { selector: String, index: usize },
    Close,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    url: String,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// A page driven through a Node.js bridge process
pub struct PlaywrightPage {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    url: String,
    closed: bool,

    /// Holds the bridge script on disk for the child's lifetime
    _script_dir: Option<TempDir>,
}

impl PlaywrightPage {
    pub async fn launch(config: &PlaywrightConfig, node_path: &OsString) -> E2eResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        debug!("Launching Playwright bridge: {}", script_path.display());

        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path)
            .current_dir(script_dir.path())
            .env("NODE_PATH", node_path)
            .env("CDB_BROWSER", config.browser.as_str())
            .env("CDB_HEADLESS", if config.headless { "1" } else { "0" })
            .env("CDB_VIEWPORT_WIDTH", config.viewport_width.to_string())
            .env("CDB_VIEWPORT_HEIGHT", config.viewport_height.to_string())
            .env("CDB_TIMEOUT_MS", config.default_timeout_ms.to_string());

        let page = Self::spawn(cmd, Some(script_dir), config.browser.as_str()).await?;
        info!("Playwright {} page ready", config.browser.as_str());
        Ok(page)
    }

    /// Start a bridge process and wait for its ready line
    pub(crate) async fn spawn(
        mut cmd: TokioCommand,
        script_dir: Option<TempDir>,
        label: &str,
    ) -> E2eResult<Self> {
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdout unavailable".into()))?;

        let mut page = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
            url: String::new(),
            closed: false,
            _script_dir: script_dir,
        };

        let ready = tokio::time::timeout(LAUNCH_TIMEOUT, page.read_until(|r| r.ready))
            .await
            .map_err(|_| E2eError::Timeout(format!("{} launch", label)))??;
        page.url = ready.url;
        Ok(page)
    }

    async fn read_until<F>(&mut self, wanted: F) -> E2eResult<Response>
    where
        F: Fn(&Response) -> bool,
    {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Bridge("bridge exited".into()))?;
            match serde_json::from_str::<Response>(&line) {
                Ok(response) if wanted(&response) => return Ok(response),
                Ok(_) => debug!("Ignoring stale bridge response: {}", line),
                Err(_) => debug!("[bridge] {}", line),
            }
        }
    }

    async fn call(&mut self, request: Request<'_>, what: &str) -> E2eResult<serde_json::Value> {
        if self.closed {
            return Err(E2eError::Bridge("page already closed".into()));
        }
        self.next_id += 1;
        let id = self.next_id;

        let mut line = serde_json::to_string(&Envelope { id, request })?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let response = self.read_until(|r| r.id == Some(id)).await?;
        if !response.url.is_empty() {
            self.url = response.url;
        }
        if response.ok {
            return Ok(response.value);
        }

        let message = format!("{}: {}", what, response.error.unwrap_or_default());
        Err(match response.kind.as_deref() {
            Some("timeout") => E2eError::Timeout(message),
            Some("not_found") => E2eError::LocatorNotFound(message),
            _ => E2eError::Bridge(message),
        })
    }

    async fn terminate(&mut self) {
        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await.is_ok()
                {
                    return;
                }
            }
        }

        // Force kill if still running
        let _ = self.child.kill().await;
    }
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.call(Request::Goto { url }, url).await.map(drop)
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        let selector = locator.to_playwright();
        self.call(Request::Fill { selector: selector.clone(), value }, &selector)
            .await
            .map(drop)
    }

    async fn select_option(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        let selector = locator.to_playwright();
        self.call(Request::Select { selector: selector.clone(), value }, &selector)
            .await
            .map(drop)
    }

    async fn click(&mut self, locator: &Locator) -> E2eResult<()> {
        let selector = locator.to_playwright();
        self.call(Request::Click { selector: selector.clone() }, &selector)
            .await
            .map(drop)
    }

    async fn query_all(&mut self, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        let selector = locator.to_playwright();
        let value = self.call(Request::Count { selector: selector.clone() }, &selector).await?;
        let count = value
            .as_u64()
            .ok_or_else(|| E2eError::Bridge(format!("count of {} was {}", selector, value)))?;
        Ok((0..count as usize)
            .map(|index| ElementRef { locator: locator.clone(), index })
            .collect())
    }

    async fn inner_text(&mut self, element: &ElementRef) -> E2eResult<String> {
        let selector = element.locator.to_playwright();
        let what = format!("{} #{}", selector, element.index);
        let value = self
            .call(Request::Text { selector, index: element.index }, &what)
            .await?;
        match value {
            serde_json::Value::String(text) => Ok(text),
            other => Err(E2eError::Bridge(format!("text of {} was {}", what, other))),
        }
    }

    fn current_url(&self) -> &str {
        &self.url
    }

    async fn close(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }
        if let Err(e) = self.call(Request::Close, "close").await {
            debug!("Bridge close request failed: {}", e);
        }
        self.closed = true;
        self.terminate().await;
        Ok(())
    }
}
