//! `campusdesk hash-pin` — Hash a PIN for the `students.pin_hash` column.

pub fn run(pin: &str) -> Result<(), Box<dyn std::error::Error>> {
    let pin = pin.trim();
    if pin.is_empty() {
        return Err("PIN must not be empty".into());
    }
    if pin.contains(',') {
        return Err("PIN must not contain a comma; logins split on it".into());
    }

    println!("{}", campusdesk_security::hash_pin(pin));
    Ok(())
}
