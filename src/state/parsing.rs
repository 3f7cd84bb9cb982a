//! Key name parsing for the binding layout and log output.

/// Converts a virtual-key code to the name used in layouts and logs.
pub fn vk_to_key_name(vk: u32) -> String {
    match vk {
        0x41..=0x5A | 0x30..=0x39 => char::from(vk as u8).to_string(),
        0x60..=0x69 => format!("NUMPAD{}", vk - 0x60),
        0x70..=0x87 => format!("F{}", vk - 0x70 + 1),
        0x08 => "BACKSPACE".to_string(),
        0x09 => "TAB".to_string(),
        0x0D => "ENTER".to_string(),
        0x14 => "CAPSLOCK".to_string(),
        0x1B => "ESC".to_string(),
        0x20 => "SPACE".to_string(),
        0x21 => "PAGEUP".to_string(),
        0x22 => "PAGEDOWN".to_string(),
        0x23 => "END".to_string(),
        0x24 => "HOME".to_string(),
        0x25 => "LEFT".to_string(),
        0x26 => "UP".to_string(),
        0x27 => "RIGHT".to_string(),
        0x28 => "DOWN".to_string(),
        0x2D => "INSERT".to_string(),
        0x2E => "DELETE".to_string(),
        0x6A => "MULTIPLY".to_string(),
        0x6B => "ADD".to_string(),
        0x6D => "SUBTRACT".to_string(),
        0x6E => "DECIMAL".to_string(),
        0x6F => "DIVIDE".to_string(),
        0xBB => "PLUS".to_string(),
        0xBD => "MINUS".to_string(),
        0xA0 => "LSHIFT".to_string(),
        0xA1 => "RSHIFT".to_string(),
        0xA2 => "LCTRL".to_string(),
        0xA3 => "RCTRL".to_string(),
        0xA4 => "LALT".to_string(),
        0xA5 => "RALT".to_string(),
        0x5B => "LWIN".to_string(),
        0x5C => "RWIN".to_string(),
        0xAD => "VOLUME_MUTE".to_string(),
        0xAE => "VOLUME_DOWN".to_string(),
        0xAF => "VOLUME_UP".to_string(),
        _ => format!("VK_{:02X}", vk),
    }
}

/// Parses a key name (case-insensitive) into a virtual-key code.
pub fn key_name_to_vk(key_name: &str) -> Option<u32> {
    let key = key_name.trim().to_uppercase();

    // letters and digits map to their ASCII codes
    if key.len() == 1
        && let Some(c) = key.chars().next()
        && c.is_ascii_alphanumeric()
    {
        return Some(c as u32);
    }

    if let Some(num) = key.strip_prefix('F')
        && let Ok(num) = num.parse::<u32>()
        && (1..=24).contains(&num)
    {
        return Some(0x70 + num - 1);
    }

    if let Some(num) = key.strip_prefix("NUMPAD")
        && let Ok(num) = num.parse::<u32>()
        && num <= 9
    {
        return Some(0x60 + num);
    }

    match key.as_str() {
        "BACKSPACE" | "BACK" => Some(0x08),
        "TAB" => Some(0x09),
        "ENTER" | "RETURN" => Some(0x0D),
        "SHIFT" => Some(0x10),
        "CTRL" => Some(0x11),
        "ALT" => Some(0x12),
        "CAPSLOCK" | "CAPITAL" => Some(0x14),
        "ESC" | "ESCAPE" => Some(0x1B),
        "SPACE" => Some(0x20),
        "PAGEUP" => Some(0x21),
        "PAGEDOWN" => Some(0x22),
        "END" => Some(0x23),
        "HOME" => Some(0x24),
        "LEFT" => Some(0x25),
        "UP" => Some(0x26),
        "RIGHT" => Some(0x27),
        "DOWN" => Some(0x28),
        "INSERT" => Some(0x2D),
        "DELETE" => Some(0x2E),
        "MULTIPLY" => Some(0x6A),
        "ADD" => Some(0x6B),
        "SUBTRACT" => Some(0x6D),
        "DECIMAL" => Some(0x6E),
        "DIVIDE" => Some(0x6F),
        "PLUS" | "OEM_PLUS" => Some(0xBB),
        "MINUS" | "OEM_MINUS" => Some(0xBD),
        "LSHIFT" => Some(0xA0),
        "RSHIFT" => Some(0xA1),
        "LCTRL" => Some(0xA2),
        "RCTRL" => Some(0xA3),
        "LALT" => Some(0xA4),
        "RALT" => Some(0xA5),
        "LWIN" => Some(0x5B),
        "RWIN" => Some(0x5C),
        "VOLUME_MUTE" => Some(0xAD),
        "VOLUME_DOWN" => Some(0xAE),
        "VOLUME_UP" => Some(0xAF),
        _ => None,
    }
}
