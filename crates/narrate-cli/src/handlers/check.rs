//! Check command handler: show the effective settings and engine choice.

use narrate_core::EngineKind;

use crate::bootstrap::CliContext;

/// Engine `play()` would pick right now without a per-call voice.
fn expected_engine(ctx: &CliContext) -> EngineKind {
    if ctx.remote_available && ctx.premium && ctx.settings.remote_voice.is_some() {
        EngineKind::Remote
    } else {
        EngineKind::Local
    }
}

/// Execute the check command.
pub fn execute(ctx: &CliContext) {
    let settings = &ctx.settings;

    println!("Remote endpoint: {}", settings.remote_endpoint.as_deref().unwrap_or("(none)"));
    println!("Remote voice:    {}", settings.remote_voice.as_deref().unwrap_or("(none)"));
    println!("Remote engine:   {}", if ctx.remote_available { "available" } else { "unavailable" });
    println!("Premium voice:   {}", if ctx.premium { "allowed" } else { "not allowed" });
    println!(
        "Abort superseded requests: {}",
        settings.effective_abort_superseded()
    );
    println!("Local program:   {}", settings.effective_local_program());
    match settings.local_args {
        Some(ref args) => println!("Local args:      {}", args.join(" ")),
        None => println!("Local rate:      {} wpm", settings.effective_local_rate()),
    }
    println!();
    println!("Playback will use the {} engine.", expected_engine(ctx).label());
}
