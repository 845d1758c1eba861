//! Drives a dialog session without any UI and prints what a frontend would
//! draw.
//!
//! Run: `RUST_LOG=dear_filesystem=trace cargo run -p dear-filesystem --example headless_browse -- <dir>`
//!
//! `<dir>` may point into a `.zip` file (`some/bundle.zip/docs`).

use dear_filesystem::{
    BrowserConfig, DialogMode, DialogRequest, DialogSession, DialogSnapshot, SessionEvent,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "dear_filesystem=debug,warn".into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn print_snapshot(snap: &DialogSnapshot) {
    println!("== {} ({:?})", snap.title, snap.state);
    println!("   at {}", snap.current_path);
    let crumbs: Vec<String> = snap
        .breadcrumbs
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut c = c.clone();
            if Some(i) == snap.archive_breadcrumb {
                c.push_str(" [zip]");
            }
            if i == snap.selected_breadcrumb {
                format!("<{c}>")
            } else {
                c
            }
        })
        .collect();
    println!("   path: {}", crumbs.join(" > "));
    for d in &snap.directories {
        println!("   [dir]  {}", d.label);
    }
    for f in &snap.files {
        let marker = if f.browsable { "[zip] " } else { "      " };
        println!("   {marker}{} ({} bytes)", f.label, f.size.unwrap_or(0));
    }
    if let Some(err) = &snap.error {
        println!("   error: {err}");
    }
}

fn main() {
    init_tracing();

    let start = std::env::args().nth(1).unwrap_or_default();
    let mut dialog = DialogSession::new(BrowserConfig::default());
    dialog.trigger(DialogRequest::new(DialogMode::OpenFile).directory(start));
    dialog.tick();

    let snap = dialog.snapshot();
    println!("known directories:");
    for (i, k) in snap.known_directories.iter().enumerate() {
        let group = if i < snap.known_user_count { "user" } else { "drive" };
        println!("   {group:5} {} -> {}", k.label, k.path);
    }
    print_snapshot(&snap);

    if let Some(i) = snap.files.iter().position(|f| f.browsable) {
        dialog.handle_event(SessionEvent::BrowseArchive(i));
    } else if !snap.directories.is_empty() {
        dialog.handle_event(SessionEvent::OpenDirectory(0));
    }
    if dialog.tick() {
        print_snapshot(&dialog.snapshot());
        dialog.handle_event(SessionEvent::Back);
        dialog.tick();
        print_snapshot(&dialog.snapshot());
    }
}
