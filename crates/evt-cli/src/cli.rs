//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use evt_core::{AgeLimit, EventRestrictions, Gender, GenderRestriction, ParticipantForm, RaceRole};

/// Event registration and race timing.
///
/// Validates registrations against event restrictions, manages participants,
/// times races and reviews their results on the events server.
#[derive(Debug, Parser)]
#[command(name = "evt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check a registration form offline against a set of restrictions.
    ///
    /// Exits with status 1 when the form is invalid.
    Validate {
        #[command(flatten)]
        form: FormArgs,

        #[command(flatten)]
        restrictions: RestrictionArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Register a participant for an event.
    Register {
        /// Event id or folder.
        #[arg(short, long)]
        event: Option<String>,

        #[command(flatten)]
        form: FormArgs,
    },

    /// List events on the server.
    Events {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage an event's registrations.
    #[command(subcommand)]
    Participants(ParticipantsAction),

    /// Review saved race results.
    #[command(subcommand)]
    Results(ResultsAction),

    /// Time a race from an interactive console.
    Race {
        /// Event id the results are saved under.
        #[arg(short, long)]
        event: Option<String>,
    },
}

/// Participant subcommands.
#[derive(Debug, Subcommand)]
pub enum ParticipantsAction {
    /// List registrations.
    List {
        /// Event folder.
        #[arg(short, long)]
        event: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete a registration.
    Delete {
        /// Event folder.
        #[arg(short, long)]
        event: Option<String>,

        /// Participant id.
        id: String,
    },

    /// Change fields of a registration; the result is re-validated first.
    Update {
        /// Event folder.
        #[arg(short, long)]
        event: Option<String>,

        /// Participant id.
        id: String,

        #[command(flatten)]
        changes: FormArgs,
    },
}

/// Results subcommands.
#[derive(Debug, Subcommand)]
pub enum ResultsAction {
    /// Show saved results grouped by session.
    List {
        /// Event id.
        #[arg(short, long)]
        event: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export one session's results.
    Export {
        /// Event id.
        #[arg(short, long)]
        event: Option<String>,

        /// Session key as shown by `results list`, e.g. "01/06/2024 at 10:00".
        #[arg(short, long)]
        group: String,

        /// Document format.
        #[arg(short, long, value_enum, default_value_t)]
        format: ExportFormat,

        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete every entry of one session from the server.
    DeleteGroup {
        /// Event id.
        #[arg(short, long)]
        event: Option<String>,

        /// Session key as shown by `results list`.
        #[arg(short, long)]
        group: String,
    },
}

/// Rendered export format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Aligned plain-text table.
    #[default]
    Text,
    /// Comma-separated values.
    Csv,
    /// Standalone HTML page.
    Html,
}

/// Registration form fields. Omitted fields are left as they are.
#[derive(Debug, Clone, Default, Args)]
pub struct FormArgs {
    /// First name.
    #[arg(long)]
    pub name: Option<String>,

    /// Last name.
    #[arg(long)]
    pub surname: Option<String>,

    /// Age in years.
    #[arg(long, allow_hyphen_values = true)]
    pub age: Option<String>,

    /// male, female or other.
    #[arg(long)]
    pub gender: Option<Gender>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    /// spectator or participant.
    #[arg(long)]
    pub race_role: Option<RaceRole>,
}

impl FormArgs {
    /// Overwrites the fields that were given on the command line.
    pub fn apply(&self, form: &mut ParticipantForm) {
        if let Some(name) = &self.name {
            form.name.clone_from(name);
        }
        if let Some(surname) = &self.surname {
            form.surname.clone_from(surname);
        }
        if let Some(age) = &self.age {
            form.age.clone_from(age);
        }
        if let Some(gender) = self.gender {
            form.gender = Some(gender);
        }
        if let Some(email) = &self.email {
            form.email.clone_from(email);
        }
        if let Some(phone) = &self.phone {
            form.phone.clone_from(phone);
        }
        if let Some(role) = self.race_role {
            form.race_role = Some(role);
        }
    }

    /// A fresh form holding only the given fields.
    pub fn to_form(&self) -> ParticipantForm {
        let mut form = ParticipantForm::default();
        self.apply(&mut form);
        form
    }
}

/// Event restrictions for offline validation.
#[derive(Debug, Clone, Default, Args)]
pub struct RestrictionArgs {
    /// The event is a race; a race role is required.
    #[arg(long)]
    pub race: bool,

    /// none, 18+ or children.
    #[arg(long)]
    pub age_limit: Option<AgeLimit>,

    /// Oldest admitted age when the age limit is children.
    #[arg(long)]
    pub max_child_age: Option<u32>,

    /// any, male or female.
    #[arg(long)]
    pub gender_restriction: Option<GenderRestriction>,
}

impl RestrictionArgs {
    pub fn to_restrictions(&self) -> EventRestrictions {
        EventRestrictions {
            is_race: self.race,
            age_limit: self.age_limit.unwrap_or_default(),
            max_child_age: self.max_child_age.filter(|max| *max > 0),
            gender_restriction: self.gender_restriction.unwrap_or_default(),
            ..EventRestrictions::default()
        }
    }
}
