//! Room codes and key-code fragments.
//!
//! Two room code formats exist side by side: the editor issues 8-character
//! codes over the full uppercase alphanumeric alphabet, while codes minted for
//! play sessions are 6 characters over an alphabet without the look-alike
//! symbols `0 O 1 I`. Both validate as room codes.

use rand::Rng;

/// Uppercase letters and digits.
pub const FULL_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Uppercase letters and digits without `0`, `O`, `1`, `I`.
pub const UNAMBIGUOUS_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const FRAGMENT_MIN_LEN: usize = 3;
pub const FRAGMENT_MAX_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomCodeFormat {
    /// Codes issued when the editor saves a room.
    Editor,
    /// Codes minted by the play registry.
    Play,
}

impl RoomCodeFormat {
    pub fn default_length(&self) -> usize {
        match self {
            RoomCodeFormat::Editor => 8,
            RoomCodeFormat::Play => 6,
        }
    }

    pub fn alphabet(&self) -> &'static [u8] {
        match self {
            RoomCodeFormat::Editor => FULL_ALPHABET,
            RoomCodeFormat::Play => UNAMBIGUOUS_ALPHABET,
        }
    }
}

/// Draw `len` symbols uniformly from `alphabet`.
pub fn random_code<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// Draw one candidate room code. Collision checks belong to the registry.
pub fn draw_room_code(format: RoomCodeFormat, len: usize) -> String {
    let mut rng = rand::thread_rng();
    random_code(&mut rng, format.alphabet(), len)
}

/// Fresh 3-5 character key-code fragment awarded for a correct answer.
pub fn generate_key_fragment() -> String {
    let mut rng = rand::thread_rng();
    let len = rng.gen_range(FRAGMENT_MIN_LEN..=FRAGMENT_MAX_LEN);
    random_code(&mut rng, FULL_ALPHABET, len)
}

/// Case-insensitive comparison used when a player types a fragment into a lock.
pub fn fragment_matches(entered: &str, fragment: &str) -> bool {
    let entered = entered.trim();
    !entered.is_empty() && entered.eq_ignore_ascii_case(fragment)
}
