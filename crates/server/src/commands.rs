//! Static replies for slash commands
//!
//! Commands are answered by the transport layer directly. They never reach
//! the dialogue engine and are not recorded in the conversation.

const WELCOME: &str = "Welcome to Swiggles Hospital!\n\n\
I can help you with:\n\
1. Booking appointments - /bookappointment\n\
2. Getting medical reports - /getreport\n\
3. Reporting emergencies - /emergency\n\n\
Or just type your question and I'll do my best to help you.";

/// Reply for a slash command, or `None` when the message is free text
pub fn reply_for(message: &str) -> Option<&'static str> {
    let message = message.trim();
    if !message.starts_with('/') {
        return None;
    }

    // "/start@SomeBot extra words" -> "/start"
    let command = message
        .split_whitespace()
        .next()
        .unwrap_or(message)
        .split('@')
        .next()
        .unwrap_or(message);

    Some(match command.to_ascii_lowercase().as_str() {
        "/start" | "/help" => WELCOME,
        "/bookappointment" => "Please provide the time of the appointment.",
        "/getreport" => "Just ask me for your medical report and I'll look it up for you.",
        "/emergency" | "/reportemergency" => "Please provide the details of the emergency.",
        _ => "Sorry, I don't know that command. Type /help to see what I can do.",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_is_not_a_command() {
        assert_eq!(reply_for("book me in at 10"), None);
        assert_eq!(reply_for("what does /help do?"), None);
    }

    #[test]
    fn known_commands() {
        assert!(reply_for("/start").unwrap().contains("Welcome"));
        assert_eq!(reply_for(" /HELP "), reply_for("/start"));
        assert_eq!(
            reply_for("/emergency@HospitalBot"),
            Some("Please provide the details of the emergency.")
        );
        assert_eq!(
            reply_for("/bookappointment now"),
            Some("Please provide the time of the appointment.")
        );
    }

    #[test]
    fn unknown_command_gets_a_hint() {
        assert!(reply_for("/cancel").unwrap().contains("/help"));
    }
}
