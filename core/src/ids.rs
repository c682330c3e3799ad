use rand::{distributions::Alphanumeric, Rng};

pub const ITEM_ID_LEN: usize = 10;

/// Fresh item id: ten random ASCII letters and digits.
pub fn generate_item_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ITEM_ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_ten_alphanumerics() {
        let id = generate_item_id();
        assert_eq!(id.len(), ITEM_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn ids_differ() {
        assert_ne!(generate_item_id(), generate_item_id());
    }
}
