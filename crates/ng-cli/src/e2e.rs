//! Chrome end-to-end checks for the unpacked extension.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use thirtyfour::prelude::*;
use thirtyfour::ChromeCapabilities;

const SITE: &str = "https://www.twitch.tv";
const OVERLAY_SELECTOR: &str = "#gb-overlay";

pub struct E2eOptions {
    pub chromedriver_url: String,
    pub extension_path: String,
    pub channel: String,
    pub headless: bool,
}

pub fn run_e2e(opts: E2eOptions) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    runtime.block_on(run_e2e_async(opts))
}

async fn run_e2e_async(opts: E2eOptions) -> Result<(), String> {
    let extension_path = canonicalize_path(&opts.extension_path)?;

    let mut caps = ChromeCapabilities::new();
    let mut args = vec![
        format!("--disable-extensions-except={}", extension_path.display()),
        format!("--load-extension={}", extension_path.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-default-apps".to_string(),
        "--autoplay-policy=no-user-gesture-required".to_string(),
    ];
    if opts.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    for arg in &args {
        caps.add_arg(arg)
            .map_err(|e| format!("Failed to set chrome arg: {}", e))?;
    }

    let driver = WebDriver::new(&opts.chromedriver_url, caps)
        .await
        .map_err(|e| format!("Failed to connect to chromedriver: {}", e))?;

    let mut errors = Vec::new();

    if let Err(e) = check_blocked_channel(&driver, &opts.channel).await {
        errors.push(format!("Blocked channel check failed: {}", e));
    }

    if let Err(e) = check_clear_page(&driver).await {
        errors.push(format!("Clear page check failed: {}", e));
    }

    if let Err(e) = check_proceed_anyway(&driver, &opts.channel).await {
        errors.push(format!("Proceed anyway check failed: {}", e));
    }

    driver.quit().await.ok();

    if errors.is_empty() {
        println!("\u{2713} E2E checks passed");
        Ok(())
    } else {
        Err(format!("E2E failed:\n- {}", errors.join("\n- ")))
    }
}

/// Overlay present, naming the channel, and media muted.
async fn check_blocked_channel(driver: &WebDriver, channel: &str) -> Result<(), String> {
    open(driver, &format!("{}/{}", SITE, channel)).await?;
    let overlay = driver
        .find(By::Css(OVERLAY_SELECTOR))
        .await
        .map_err(|e| format!("Overlay missing: {}", e))?;
    let text = overlay.text().await.map_err(|e| e.to_string())?;
    if !text.to_lowercase().contains(&channel.to_lowercase()) {
        return Err(format!("Overlay does not name '{}'", channel));
    }

    let count = eval_u64(driver, "return document.querySelectorAll('#gb-overlay').length;").await?;
    if count != 1 {
        return Err(format!("Expected one overlay, found {}", count));
    }

    let audible = eval_u64(
        driver,
        "return [...document.querySelectorAll('video')].filter(v => !v.muted && !v.paused).length;",
    )
    .await?;
    if audible > 0 {
        return Err(format!("{} video element(s) still playing with sound", audible));
    }
    Ok(())
}

async fn check_clear_page(driver: &WebDriver) -> Result<(), String> {
    open(driver, &format!("{}/directory", SITE)).await?;
    let count = eval_u64(driver, "return document.querySelectorAll('#gb-overlay').length;").await?;
    if count != 0 {
        return Err("Overlay shown on a clear page".to_string());
    }
    Ok(())
}

async fn check_proceed_anyway(driver: &WebDriver, channel: &str) -> Result<(), String> {
    open(driver, &format!("{}/{}", SITE, channel)).await?;
    let buttons = driver
        .find_all(By::Css("#gb-overlay button"))
        .await
        .map_err(|e| e.to_string())?;
    let proceed = buttons
        .get(1)
        .ok_or_else(|| "Proceed button missing".to_string())?;
    proceed.click().await.map_err(|e| e.to_string())?;

    // Survives the follow-up scans
    tokio::time::sleep(Duration::from_secs(2)).await;
    let count = eval_u64(driver, "return document.querySelectorAll('#gb-overlay').length;").await?;
    if count != 0 {
        return Err("Overlay came back after proceeding".to_string());
    }
    Ok(())
}

async fn open(driver: &WebDriver, url: &str) -> Result<(), String> {
    driver
        .goto(url)
        .await
        .map_err(|e| format!("Failed to open {}: {}", url, e))?;
    // Initial follow-up scans run at one and three seconds
    tokio::time::sleep(Duration::from_secs(4)).await;
    Ok(())
}

async fn eval_u64(driver: &WebDriver, script: &str) -> Result<u64, String> {
    let result = driver
        .execute(script, Vec::<Value>::new())
        .await
        .map_err(|e| format!("Script failed: {}", e))?;
    Ok(result.json().as_u64().unwrap_or(0))
}

fn canonicalize_path(path: &str) -> Result<PathBuf, String> {
    std::fs::canonicalize(path)
        .map_err(|e| format!("Failed to resolve '{}': {}", path, e))
}
