use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sql_types::Text;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProfileDirectory;
use crate::schema::customer_profiles;

define_sql_function!(fn lower(x: Text) -> Text);

/// Read-only view over the profiles synced from the auth provider.
pub struct DieselProfileDirectory {
    pool: DbPool,
}

impl DieselProfileDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProfileDirectory for DieselProfileDirectory {
    fn has_profile(&self, email: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        // served by the lower(email) unique index
        let found = diesel::select(exists(
            customer_profiles::table.filter(lower(customer_profiles::email).eq(email.trim().to_lowercase())),
        ))
        .get_result::<bool>(&mut conn)?;
        Ok(found)
    }
}
