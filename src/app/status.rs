use trigger_desk::Config;
use trigger_desk::form::FormOptions;
use trigger_desk::model::SelectOption;

pub fn render_config(config: &Config) -> String {
    let channel = config
        .channel_url()
        .map_or_else(|e| format!("(invalid: {e})"), |u| u.to_string());
    let lines = [
        "◆ Trigger Desk".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        String::new(),
        format!("  Server    {}", config.server_url),
        format!("  Channel   {channel}"),
        format!(
            "  Database  {}",
            if config.database_url.is_some() {
                "configured"
            } else {
                "(not set)"
            }
        ),
        format!("  Snapshot timeout  {}s", config.snapshot_timeout_secs),
    ];
    lines.join("\n")
}

pub fn render_options(options: &FormOptions) -> String {
    let mut out = String::new();
    push_section(&mut out, "Trigger tags", &options.tags);
    push_section(&mut out, "Trigger messages (unstructured reply)", &options.trigger_messages);
    push_section(&mut out, "Messages to trigger", &options.messages);
    out
}

fn push_section(out: &mut String, title: &str, options: &[SelectOption]) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!("{title} ({})\n", options.len()));
    if options.is_empty() {
        out.push_str("  (none)\n");
    }
    for option in options {
        out.push_str(&format!("  {:>6}  {}\n", option.value, option.label));
    }
}
