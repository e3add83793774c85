//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    DatabaseID, Error,
    category::{Category, CategoryName},
    transaction::TransactionType,
    user::UserID,
};

/// Create a category for `user_id` and return it with its generated ID.
pub fn create_category(
    name: CategoryName,
    category_type: TransactionType,
    icon: Option<String>,
    color: Option<String>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let created_at = time::OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO category (user_id, name, category_type, icon, color, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        (
            user_id.as_i64(),
            name.as_ref(),
            category_type.as_str(),
            &icon,
            &color,
            created_at,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        user_id,
        name,
        category_type,
        icon,
        color,
        created_at,
    })
}

/// Retrieve a single category owned by `user_id`.
pub fn get_category(
    category_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, category_type, icon, color, created_at
             FROM category WHERE id = :id AND user_id = :user_id;",
        )?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of a user's categories, ordered by type and then name.
pub fn get_all_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, category_type, icon, color, created_at
             FROM category WHERE user_id = :user_id
             ORDER BY category_type ASC, name ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the stored row for `category` with its current field values.
///
/// # Errors
///
/// Returns an [Error::UpdateMissingCategory] if the category is not in the
/// database or belongs to another user.
pub fn update_category(category: &Category, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, category_type = ?2, icon = ?3, color = ?4
         WHERE id = ?5 AND user_id = ?6;",
        (
            category.name.as_ref(),
            category.category_type.as_str(),
            &category.icon,
            &category.color,
            category.id,
            category.user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category owned by `user_id`.
///
/// Transactions that referenced the category keep their other fields but
/// become uncategorized, via the ON DELETE SET NULL clause on the
/// transaction table.
///
/// # Errors
///
/// Returns an [Error::DeleteMissingCategory] if the category is not in the
/// database or belongs to another user.
pub fn delete_category(
    category_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2;",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            category_type TEXT NOT NULL,
            icon TEXT,
            color TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);

    let raw_name: String = row.get(2)?;
    let name = CategoryName::new_unchecked(&raw_name);

    let raw_type: String = row.get(3)?;
    let category_type = raw_type.parse().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(error))
    })?;

    let icon = row.get(4)?;
    let color = row.get(5)?;
    let created_at = row.get(6)?;

    Ok(Category {
        id,
        user_id,
        name,
        category_type,
        icon,
        color,
        created_at,
    })
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        category::CategoryName,
        db::initialize,
        password::PasswordHash,
        transaction::TransactionType,
        user::{UserID, create_user},
    };

    use super::{
        create_category, delete_category, get_all_categories, get_category, update_category,
    };

    fn get_test_db_connection() -> (Connection, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");

        let user = create_user(
            "test@test.com".parse().unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (connection, user.id)
    }

    fn make_category(
        name: &str,
        category_type: TransactionType,
        user_id: UserID,
        connection: &Connection,
    ) -> crate::category::Category {
        create_category(
            CategoryName::new_unchecked(name),
            category_type,
            None,
            None,
            user_id,
            connection,
        )
        .expect("Could not create test category")
    }

    #[test]
    fn create_category_succeeds() {
        let (connection, user_id) = get_test_db_connection();

        let category = create_category(
            CategoryName::new_unchecked("Groceries"),
            TransactionType::Expense,
            Some("cart".to_owned()),
            Some("#ff0000".to_owned()),
            user_id,
            &connection,
        )
        .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name.as_ref(), "Groceries");
        assert_eq!(category.category_type, TransactionType::Expense);
        assert_eq!(category.icon.as_deref(), Some("cart"));
        assert_eq!(category.color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn get_category_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let inserted = make_category("Food", TransactionType::Expense, user_id, &connection);

        let selected = get_category(inserted.id, user_id, &connection);

        assert_eq!(Ok(inserted), selected);
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let (connection, user_id) = get_test_db_connection();
        let inserted = make_category("Food", TransactionType::Expense, user_id, &connection);

        let selected = get_category(inserted.id + 123, user_id, &connection);

        assert_eq!(selected, Err(Error::NotFound));
    }

    #[test]
    fn get_category_of_other_user_returns_not_found() {
        let (connection, user_id) = get_test_db_connection();
        let other_user = create_user(
            "other@test.com".parse().unwrap(),
            crate::password::PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let inserted = make_category("Food", TransactionType::Expense, user_id, &connection);

        let selected = get_category(inserted.id, other_user.id, &connection);

        assert_eq!(selected, Err(Error::NotFound));
    }

    #[test]
    fn get_all_categories_orders_by_type_then_name() {
        let (connection, user_id) = get_test_db_connection();
        let rent = make_category("Rent", TransactionType::Expense, user_id, &connection);
        let salary = make_category("Salary", TransactionType::Income, user_id, &connection);
        let food = make_category("Food", TransactionType::Expense, user_id, &connection);

        let categories = get_all_categories(user_id, &connection).unwrap();

        assert_eq!(categories, vec![food, rent, salary]);
    }

    #[test]
    fn get_all_categories_excludes_other_users() {
        let (connection, user_id) = get_test_db_connection();
        let other_user = create_user(
            "other@test.com".parse().unwrap(),
            crate::password::PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        make_category("Theirs", TransactionType::Expense, other_user.id, &connection);
        let mine = make_category("Mine", TransactionType::Expense, user_id, &connection);

        let categories = get_all_categories(user_id, &connection).unwrap();

        assert_eq!(categories, vec![mine]);
    }

    #[test]
    fn update_category_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let mut category = make_category("Food", TransactionType::Expense, user_id, &connection);

        category.name = CategoryName::new_unchecked("Dining out");
        category.color = Some("#00ff00".to_owned());
        update_category(&category, &connection).unwrap();

        let updated = get_category(category.id, user_id, &connection).unwrap();
        assert_eq!(updated, category);
    }

    #[test]
    fn update_category_of_other_user_fails() {
        let (connection, user_id) = get_test_db_connection();
        let other_user = create_user(
            "other@test.com".parse().unwrap(),
            crate::password::PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let mut category = make_category("Food", TransactionType::Expense, user_id, &connection);
        category.user_id = other_user.id;

        let result = update_category(&category, &connection);

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_category_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let category = make_category("Food", TransactionType::Expense, user_id, &connection);

        delete_category(category.id, user_id, &connection).unwrap();

        assert_eq!(
            get_category(category.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_category_with_invalid_id_fails() {
        let (connection, user_id) = get_test_db_connection();

        let result = delete_category(999999, user_id, &connection);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
    }
}
