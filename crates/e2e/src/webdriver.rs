//! W3C WebDriver client
//!
//! Just enough of the protocol to script the front-end: sessions,
//! navigation, element lookup, attributes, input and script execution.
//! Every call is a blocking HTTP round trip to chromedriver.

use std::cell::Cell;
use std::path::PathBuf;
use std::time::Duration;

use molview_waiters::{Handle, HandleError, Locator};
use reqwest::blocking::Client;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::driver::Driver;
use crate::error::{E2eError, E2eResult};

/// Key under which W3C element references are serialized
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// W3C error code for a failed element lookup
const NO_SUCH_ELEMENT: &str = "no such element";

/// W3C error code for a script that threw
const JAVASCRIPT_ERROR: &str = "javascript error";

/// Reference to a DOM node in a session. Equal refs name the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

impl ElementRef {
    fn from_wire(value: &Value) -> E2eResult<Self> {
        value[ELEMENT_KEY]
            .as_str()
            .map(|id| ElementRef(id.to_string()))
            .ok_or_else(|| E2eError::Protocol(format!("expected element reference, got {}", value)))
    }
}

/// Chrome launch options
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub binary: Option<PathBuf>,
    pub args: Vec<String>,
}

impl BrowserOptions {
    /// Session capabilities for `POST /session`
    pub fn capabilities(&self) -> Value {
        let mut args = self.args.clone();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        // the front-end talks to a local API server on another port
        args.push("--disable-web-security".to_string());

        let mut chrome = json!({ "args": args });
        if let Some(binary) = &self.binary {
            chrome["binary"] = json!(binary.to_string_lossy());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": chrome,
                }
            }
        })
    }
}

/// An open browser session
pub struct Session {
    client: Client,
    /// `<driver>/session/<id>`
    url: String,
    id: String,
    closed: Cell<bool>,
}

impl Session {
    /// Open a new browser session on the driver at `driver_url`
    pub fn start(driver_url: &str, options: &BrowserOptions) -> E2eResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        let resp = client
            .post(format!("{}/session", driver_url))
            .json(&options.capabilities())
            .send()?;
        let value = unwrap_response(resp.json()?)?;

        let id = value["sessionId"]
            .as_str()
            .ok_or_else(|| E2eError::Protocol(format!("missing sessionId in {}", value)))?
            .to_string();
        debug!(session = %id, "Started browser session");

        Ok(Self {
            client,
            url: format!("{}/session/{}", driver_url, id),
            id,
            closed: Cell::new(false),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn command(&self, method: Method, path: &str, body: Option<Value>) -> E2eResult<Value> {
        let url = format!("{}{}", self.url, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        } else if method == Method::POST {
            request = request.json(&json!({}));
        }
        let wire: Value = request.send()?.json()?;
        unwrap_response(wire)
    }

    pub fn navigate(&self, url: &str) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url })))?;
        Ok(())
    }

    pub fn find(&self, locator: &Locator) -> E2eResult<ElementRef> {
        let value = self.command(Method::POST, "/element", Some(selector_body(locator)))?;
        ElementRef::from_wire(&value)
    }

    pub fn find_all(&self, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        let value = self.command(Method::POST, "/elements", Some(selector_body(locator)))?;
        element_list(&value)
    }

    pub fn find_within(&self, parent: &ElementRef, locator: &Locator) -> E2eResult<ElementRef> {
        let path = format!("/element/{}/element", parent.0);
        let value = self.command(Method::POST, &path, Some(selector_body(locator)))?;
        ElementRef::from_wire(&value)
    }

    pub fn find_all_within(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> E2eResult<Vec<ElementRef>> {
        let path = format!("/element/{}/elements", parent.0);
        let value = self.command(Method::POST, &path, Some(selector_body(locator)))?;
        element_list(&value)
    }

    pub fn attribute(&self, element: &ElementRef, name: &str) -> E2eResult<Option<String>> {
        let path = format!("/element/{}/attribute/{}", element.0, name);
        Ok(self.command(Method::GET, &path, None)?.as_str().map(String::from))
    }

    pub fn property(&self, element: &ElementRef, name: &str) -> E2eResult<Value> {
        let path = format!("/element/{}/property/{}", element.0, name);
        self.command(Method::GET, &path, None)
    }

    pub fn text(&self, element: &ElementRef) -> E2eResult<String> {
        let path = format!("/element/{}/text", element.0);
        Ok(self
            .command(Method::GET, &path, None)?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    pub fn click(&self, element: &ElementRef) -> E2eResult<()> {
        let path = format!("/element/{}/click", element.0);
        self.command(Method::POST, &path, None)?;
        Ok(())
    }

    pub fn send_keys(&self, element: &ElementRef, text: &str) -> E2eResult<()> {
        let path = format!("/element/{}/value", element.0);
        self.command(Method::POST, &path, Some(json!({ "text": text })))?;
        Ok(())
    }

    /// Run a synchronous script; `return` in the body becomes the result
    pub fn execute(&self, script: &str, args: Vec<Value>) -> E2eResult<Value> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
    }

    /// End the session and close the browser
    pub fn quit(&self) -> E2eResult<()> {
        if self.closed.replace(true) {
            return Ok(());
        }
        debug!(session = %self.id, "Closing browser session");
        self.command(Method::DELETE, "", None)?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.quit() {
            warn!(session = %self.id, "Failed to close session: {}", e);
        }
    }
}

fn selector_body(locator: &Locator) -> Value {
    json!({ "using": "css selector", "value": locator.to_css() })
}

fn element_list(value: &Value) -> E2eResult<Vec<ElementRef>> {
    value
        .as_array()
        .ok_or_else(|| E2eError::Protocol(format!("expected element list, got {}", value)))?
        .iter()
        .map(ElementRef::from_wire)
        .collect()
}

/// Extract `value` from a wire response, turning W3C errors into `E2eError`
fn unwrap_response(mut wire: Value) -> E2eResult<Value> {
    let value = wire["value"].take();
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(E2eError::WebDriver {
            error: error.to_string(),
            message: value["message"].as_str().unwrap_or_default().to_string(),
        });
    }
    Ok(value)
}

/// Classify a client error for waiters
fn handle_error(err: E2eError, locator: Option<&Locator>) -> HandleError {
    match (err, locator) {
        (E2eError::WebDriver { error, .. }, Some(locator)) if error == NO_SUCH_ELEMENT => {
            HandleError::NotFound(locator.clone())
        }
        (E2eError::WebDriver { error, message }, _) if error == JAVASCRIPT_ERROR => {
            HandleError::Script(message)
        }
        (err, _) => HandleError::Driver(err.to_string()),
    }
}

impl Handle for Session {
    type Element = ElementRef;

    fn locate(&self, locator: &Locator) -> Result<ElementRef, HandleError> {
        self.find(locator).map_err(|e| handle_error(e, Some(locator)))
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, HandleError> {
        Session::attribute(self, element, name).map_err(|e| handle_error(e, None))
    }

    fn is_present(&self, locator: &Locator) -> Result<bool, HandleError> {
        Session::find_all(self, locator)
            .map(|elements| !elements.is_empty())
            .map_err(|e| handle_error(e, Some(locator)))
    }

    fn execute(&self, script: &str) -> Result<Value, HandleError> {
        Session::execute(self, script, Vec::new()).map_err(|e| handle_error(e, None))
    }
}

impl Driver for Session {
    fn navigate(&self, url: &str) -> E2eResult<()> {
        Session::navigate(self, url)
    }

    fn find_all(&self, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        Session::find_all(self, locator)
    }

    fn find_within(&self, parent: &ElementRef, locator: &Locator) -> E2eResult<ElementRef> {
        Session::find_within(self, parent, locator)
    }

    fn find_all_within(&self, parent: &ElementRef, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        Session::find_all_within(self, parent, locator)
    }

    fn text(&self, element: &ElementRef) -> E2eResult<String> {
        Session::text(self, element)
    }

    fn property(&self, element: &ElementRef, name: &str) -> E2eResult<Value> {
        Session::property(self, element, name)
    }

    fn click(&self, element: &ElementRef) -> E2eResult<()> {
        Session::click(self, element)
    }

    fn send_keys(&self, element: &ElementRef, text: &str) -> E2eResult<()> {
        Session::send_keys(self, element, text)
    }

    fn close(&self) -> E2eResult<()> {
        self.quit()
    }
}
