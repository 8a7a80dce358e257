use coachbot_types::MessageId;
use rand::Rng;

/// Length of a locally minted message ID
pub const LOCAL_ID_DIGITS: usize = 19;

/// Random 19-digit numeric token: first digit 1-9, the rest 0-9
pub fn generate_local_id() -> MessageId {
    let mut rng = rand::rng();

    let mut raw = String::with_capacity(LOCAL_ID_DIGITS);
    raw.push(char::from(b'0' + rng.random_range(1..=9u8)));
    for _ in 1..LOCAL_ID_DIGITS {
        raw.push(char::from(b'0' + rng.random_range(0..=9u8)));
    }

    MessageId::local(raw)
}
