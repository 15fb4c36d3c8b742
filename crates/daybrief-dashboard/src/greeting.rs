/// Time-of-day greeting, personalised when a name is set.
pub fn greeting(hour: u32, name: &str) -> String {
    let salutation = if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    };

    let name = name.trim();
    if name.is_empty() {
        salutation.to_string()
    } else {
        format!("{}, {}", salutation, name)
    }
}
