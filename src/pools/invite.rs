use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use rand::Rng;

use crate::schema::pools;

const CODE_LEN: usize = 6;
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates an invite code no existing pool uses. Codes are short, so we
/// retry on collision rather than assume the first draw is free.
pub fn get_unique_invite_code(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<String> {
    loop {
        let mut rng = rand::rng();
        let code: String = (0..CODE_LEN)
            .map(|_| {
                CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char
            })
            .collect();

        let is_duplicate = diesel::dsl::select(diesel::dsl::exists(
            pools::table
                .filter(pools::invite_code.eq(&code))
                .select(pools::id),
        ))
        .get_result::<bool>(conn)?;

        if !is_duplicate {
            return Ok(code);
        }
    }
}
