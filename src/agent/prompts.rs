//! Fixed prompt and message text used by the conversation loop

use std::path::PathBuf;

use crate::core::UserRole;

/// Text the loop looks for in the latest bot entry to detect a pending role menu
pub const ROLE_MENU_MARKER: &str = "tell me your role";

/// Role menu appended to every greeting
pub const ROLE_MENU: &str = "<br><br>To best assist you, could you please tell me your role in this disaster situation?\
<br><br>Are you:\
<br>&emsp;1. A Survivor/Caregiver\
<br>&emsp;2. A Provider/Donor\
<br>&emsp;3. Concerned Public\
<br>&emsp;4. A Relief Organization\
<br><br>Please respond with the number that corresponds to your role.";

pub const FALLBACK_WELCOME: &str =
    "Welcome to DisasterConnect. We're here to help during this challenging time.";

pub const GREETING_REQUEST: &str =
    "Provide a compassionate and informative initial greeting for a disaster relief chatbot.";

pub const APOLOGY: &str = "I apologize, but I encountered an error while processing your request. Please try again.";

const BASE_INSTRUCTIONS: &str = "\
Objective: You are a smart, friendly virtual assistant tasked with assisting individuals affected by disasters, with context-aware responses based on the user's type.

User Types:
1. Survivor/Caregiver: Prioritize immediate relief, safety information, and support resources
2. Provider/Donor: Focus on donation channels, resource allocation, and ways to help
3. Concerned Public: Provide general information, updates, and guidance
4. Relief Organization: Offer coordination resources, emergency contact information, and strategic support

Procedure:
1. Tailor responses based on the selected user type
2. Provide specific, relevant information and resources
3. Maintain a supportive and informative tone
4. When the user needs live conditions, shelters, air quality or an email copy, use the available tools
";

/// Developer prompt: fixed instructions followed by each resource verbatim
pub fn base_prompt(resources: &[String]) -> String {
    let mut prompt = String::from(BASE_INSTRUCTIONS);
    for resource in resources {
        prompt.push('\n');
        prompt.push_str(resource);
        prompt.push('\n');
    }
    prompt
}

/// Read the resource files in order, skipping any that cannot be read
pub async fn load_resources(files: &[PathBuf]) -> Vec<String> {
    let mut resources = Vec::with_capacity(files.len());
    for path in files {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => resources.push(text),
            Err(e) => tracing::warn!("Skipping resource file {}: {}", path.display(), e),
        }
    }
    tracing::info!(
        loaded = resources.len(),
        configured = files.len(),
        "Loaded prompt resources"
    );
    resources
}

pub fn welcome_with_menu(greeting: &str) -> String {
    format!("{}{}", greeting, ROLE_MENU)
}

pub fn guidance_system(role: UserRole) -> String {
    format!(
        "You are a disaster relief chatbot. Provide specific, compassionate guidance for a {} in a disaster situation.

Context guidance:
- Survivors/Caregivers: Focus on immediate needs, safety, and support resources
- Providers/Donors: Explain ways to provide meaningful assistance
- Concerned Public: Offer accurate, up-to-date information and ways to stay informed
- Relief Organizations: Provide coordination resources and strategic support",
        role
    )
}

pub fn guidance_request(role: UserRole) -> String {
    format!(
        "Generate a detailed, supportive initial guidance for a {} during a disaster relief effort.",
        role
    )
}

/// System note recorded in the context once a role is chosen
pub fn role_note(role: UserRole) -> String {
    format!(
        "The user is identified as a {}. Tailor all subsequent responses to their specific needs and context.",
        role
    )
}

pub fn role_fallback(role: UserRole) -> String {
    format!(
        "Thank you for identifying yourself as a {}.<br><br>We're here to provide personalized support during this challenging time.<br>What specific assistance do you need right now?",
        role
    )
}

pub fn retrieved_context(text: &str) -> String {
    format!(
        "Relevant information from the DisasterConnect knowledge base:\n\n{}",
        text
    )
}
