use crate::core::shared::utils::digits_only;

pub const WHATSAPP_SEND_URL: &str = "https://web.whatsapp.com/send";

/// Deep link into the WhatsApp web client for a requester's phone number.
pub fn whatsapp_link(phone: &str) -> Option<String> {
    let digits = digits_only(phone);
    if digits.is_empty() {
        return None;
    }
    Some(format!("{WHATSAPP_SEND_URL}?phone={digits}"))
}
