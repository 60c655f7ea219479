/// Command palette entries and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home", "today"],
    description: "Today's and upcoming jobs",
  },
  Command {
    name: "jobs",
    aliases: &["j", "job"],
    description: "Browse and filter jobs",
  },
  Command {
    name: "clients",
    aliases: &["c", "client"],
    description: "Manage clients",
  },
  Command {
    name: "materials",
    aliases: &["m", "material", "stock"],
    description: "Manage materials and prices",
  },
  Command {
    name: "settings",
    aliases: &["s", "config", "prefs"],
    description: "Business details, backup, offline assets",
  },
  Command {
    name: "new",
    aliases: &["n", "add"],
    description: "Create a new job",
  },
  Command {
    name: "logout",
    aliases: &["lock", "signout"],
    description: "Lock the app",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit tradetrackr",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_priority(cmd, &input_lower).map(|p| (cmd, p)))
    .collect();

  // Stable sort keeps table order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better; `None` means no match.
fn match_priority(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("jobs");
    assert_eq!(suggestions[0].name, "jobs");
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "m" is an alias of materials; no name starts with "m" otherwise
    assert_eq!(get_suggestions("m")[0].name, "materials");
    // "s" is the settings alias even though "stock" also starts with it
    assert_eq!(get_suggestions("s")[0].name, "settings");
  }

  #[test]
  fn test_prefix_match() {
    assert_eq!(get_suggestions("cli")[0].name, "clients");
    assert_eq!(get_suggestions("LOG")[0].name, "logout");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("board");
    assert_eq!(suggestions[0].name, "dashboard");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("zzz").is_empty());
  }
}
