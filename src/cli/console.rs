use colored::*;
use std::collections::BTreeSet;
use std::fmt::Display;

use crate::permission::{Permissions, TreePermission};

/// Console prints authorization decisions with colored formatting
pub struct Console {
    granted_color: Color,
    denied_color: Color,
    path_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            granted_color: Color::Green,
            denied_color: Color::Red,
            path_color: Color::Cyan,
        }
    }

    /// Create a new Console with custom colors
    pub fn with_colors(granted_color: Color, denied_color: Color, path_color: Color) -> Self {
        Self {
            granted_color,
            denied_color,
            path_color,
        }
    }

    fn decision(&self, granted: bool) -> ColoredString {
        if granted {
            "✓ granted".color(self.granted_color).bold()
        } else {
            "✗ denied".color(self.denied_color).bold()
        }
    }

    fn flag(&self, label: &str, granted: bool) -> ColoredString {
        if granted {
            label.color(self.granted_color)
        } else {
            label.color(self.denied_color).dimmed()
        }
    }

    /// Line describing one decision on `path`
    pub fn render_decision(&self, path: &str, request: &str, granted: bool) -> String {
        format!(
            "{} {} {}",
            path.color(self.path_color).bold(),
            request,
            self.decision(granted)
        )
    }

    /// Line describing the permission derived for one node of a walk
    pub fn render_walk_step(&self, path: &str, permission: &TreePermission) -> String {
        let kind = match permission {
            TreePermission::All => "all",
            TreePermission::Empty => "empty",
            TreePermission::NoRecourse => "no-recourse",
            TreePermission::Leaf(_) => "leaf",
            TreePermission::Composite(_) => "composite",
        };
        format!(
            "{} [{}] {} {} {} {}",
            path.color(self.path_color).bold(),
            kind.dimmed(),
            self.flag("read", permission.can_read()),
            self.flag("read-all", permission.can_read_all()),
            self.flag("read-properties", permission.can_read_properties()),
            self.flag("write", permission.is_granted(Permissions::WRITE)),
        )
    }

    /// Print the outcome of a permission or privilege check
    pub fn print_decision(&self, path: &str, request: &str, granted: bool) {
        println!("{}", self.render_decision(path, request, granted));
    }

    pub fn print_walk_step(&self, path: &str, permission: &TreePermission) {
        println!("{}", self.render_walk_step(path, permission));
    }

    /// Print the privileges effective at `path`
    pub fn print_privileges(&self, path: &str, privileges: &BTreeSet<String>) {
        println!("{}", path.color(self.path_color).bold());
        if privileges.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for privilege in privileges {
            println!("  {}", privilege.color(self.granted_color));
        }
    }

    /// Print an informational message
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "Info:".yellow().bold(), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: impl Display) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
