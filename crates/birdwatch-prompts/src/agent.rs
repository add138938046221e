use chrono::{DateTime, Utc};

/// Static description of one pipeline agent: who it is and what it must do.
#[derive(Debug, Clone, Copy)]
pub struct AgentPrompt {
    pub name: &'static str,
    pub role: &'static str,
    pub description: &'static str,
    pub instructions: &'static [&'static str],
    /// Append the current date and time to the system message.
    pub add_datetime: bool,
}

impl AgentPrompt {
    /// Render the system message sent ahead of the user turn.
    pub fn system_message(&self, now: DateTime<Utc>) -> String {
        let mut prompt = String::new();
        prompt.push_str(self.description.trim());
        prompt.push_str("\n\n");

        prompt.push_str("<your_role>\n");
        prompt.push_str(self.role);
        prompt.push_str("\n</your_role>\n\n");

        prompt.push_str("<instructions>\n");
        for line in self.instructions {
            if line.is_empty() {
                prompt.push('\n');
            } else {
                prompt.push_str(&format!("- {line}\n"));
            }
        }
        prompt.push_str("</instructions>\n\n");

        prompt.push_str("<additional_information>\n");
        prompt.push_str("- Use markdown to format your answers.\n");
        if self.add_datetime {
            prompt.push_str(&format!(
                "- The current time is {}.\n",
                now.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        prompt.push_str("</additional_information>\n");
        prompt
    }
}
