//! Reusable UI flows. Each call assumes the page is in the state the
//! previous step left it in.

use std::path::Path;

use molview_waiters::{Locator, Match, Poller, Predicate};
use tracing::debug;

use crate::driver::Driver;
use crate::error::E2eResult;

/// Find the first element or fail with a lookup error
pub fn find<D: Driver>(driver: &D, locator: &Locator) -> E2eResult<D::Element> {
    Ok(driver.locate(locator)?)
}

pub fn click<D: Driver>(driver: &D, locator: &Locator) -> E2eResult<()> {
    let element = find(driver, locator)?;
    driver.click(&element)
}

/// Run one bounded wait with a predicate built for this call only
pub fn wait_until<D: Driver>(
    driver: &D,
    predicate: Predicate<D::Element>,
    poller: &Poller,
) -> E2eResult<Match<D::Element>> {
    Ok(poller.until(driver, predicate)?)
}

/// Type each path into a file input. Multi-file inputs accumulate.
pub fn upload_files<D, P>(driver: &D, field: &Locator, paths: &[P]) -> E2eResult<()>
where
    D: Driver,
    P: AsRef<Path>,
{
    let input = find(driver, field)?;
    for path in paths {
        let path = path.as_ref();
        debug!("Uploading {} via {}", path.display(), field);
        driver.send_keys(&input, &path.to_string_lossy())?;
    }
    Ok(())
}

/// Switch to a tab, opening its dropdown first if it lives in one.
///
/// Tabs are triggered by `<tab>-trigger` and carry class `active` once shown.
pub fn switch_tab<D: Driver>(
    driver: &D,
    tab: &str,
    dropdown: Option<&str>,
    poller: &Poller,
) -> E2eResult<()> {
    if let Some(dropdown) = dropdown {
        click(driver, &Locator::id(dropdown))?;
    }
    click(driver, &Locator::id(format!("{}-trigger", tab)))?;
    wait_until(driver, Predicate::has_class(Locator::id(tab), "active"), poller)?;
    Ok(())
}

/// Count `rows` inside `container`, minus one header row if asked
pub fn count_rows<D: Driver>(
    driver: &D,
    container: &Locator,
    rows: &Locator,
    skip_header: bool,
) -> E2eResult<usize> {
    let container = find(driver, container)?;
    let found = driver.find_all_within(&container, rows)?.len();
    Ok(if skip_header {
        found.saturating_sub(1)
    } else {
        found
    })
}
