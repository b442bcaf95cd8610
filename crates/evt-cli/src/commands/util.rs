//! Shared output helpers for CLI commands.

use std::io::Write;

use evt_core::{FieldErrors, NormalizedParticipant};

/// Placeholder for blank optional values.
pub fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

/// One `field: message` line per validation error, in form order.
pub fn write_field_errors<W: Write>(writer: &mut W, errors: &FieldErrors) -> std::io::Result<()> {
    for (field, message) in errors.iter() {
        writeln!(writer, "  {field}: {message}")?;
    }
    Ok(())
}

/// Labelled fields of a normalized participant.
pub fn write_participant<W: Write>(
    writer: &mut W,
    participant: &NormalizedParticipant,
) -> std::io::Result<()> {
    let gender = participant.gender.map(|g| g.to_string()).unwrap_or_default();
    writeln!(writer, "  name:      {}", participant.name)?;
    writeln!(writer, "  surname:   {}", participant.surname)?;
    writeln!(writer, "  age:       {}", participant.age)?;
    writeln!(writer, "  gender:    {}", or_dash(&gender))?;
    writeln!(writer, "  email:     {}", or_dash(&participant.email))?;
    writeln!(writer, "  phone:     {}", or_dash(&participant.phone))?;
    if let Some(role) = participant.race_role {
        writeln!(writer, "  race role: {role}")?;
    }
    Ok(())
}
