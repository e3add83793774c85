//! Database operations for transactions.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

use crate::{
    DatabaseID, Error,
    category::{Category, CategoryName, db::get_category},
    transaction::{Transaction, TransactionType},
    user::UserID,
};

/// The data needed to insert a transaction.
///
/// The caller is expected to have validated the fields with the functions in
/// the domain module.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// The amount of money.
    pub amount: Decimal,
    /// A short description of the transaction.
    pub description: String,
    /// The ID of one of the user's categories, if the transaction has one.
    pub category_id: Option<DatabaseID>,
    /// The day the transaction happened.
    pub date: Date,
}

/// A filter for querying a user's transactions.
#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    /// Only include transactions within this date range.
    pub date_range: Option<RangeInclusive<Date>>,
    /// Only include transactions of this type.
    pub transaction_type: Option<TransactionType>,
    /// Only include transactions filed under this category.
    pub category_id: Option<DatabaseID>,
    /// Return at most this many transactions.
    pub limit: Option<u32>,
}

/// Check that `category_id` refers to one of `user_id`'s categories.
///
/// # Errors
///
/// Returns an [Error::InvalidCategory] if the category does not exist or
/// belongs to another user.
pub fn verify_category(
    category_id: Option<DatabaseID>,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match category_id {
        None => Ok(()),
        Some(id) => match get_category(id, user_id, connection) {
            Ok(_) => Ok(()),
            Err(Error::NotFound) => Err(Error::InvalidCategory(Some(id))),
            Err(error) => Err(error),
        },
    }
}

/// Insert a transaction and return it with its generated ID and resolved
/// category.
///
/// # Errors
///
/// Returns an [Error::InvalidCategory] if the new transaction's category does
/// not exist or belongs to another user.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    verify_category(
        new_transaction.category_id,
        new_transaction.user_id,
        connection,
    )?;

    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO \"transaction\"
         (user_id, category_id, transaction_type, amount, description, date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        (
            new_transaction.user_id.as_i64(),
            new_transaction.category_id,
            new_transaction.transaction_type.as_str(),
            new_transaction.amount.to_string(),
            &new_transaction.description,
            new_transaction.date,
            created_at,
        ),
    )?;

    let id = connection.last_insert_rowid();

    get_transaction(id, new_transaction.user_id, connection)
}

const SELECT_TRANSACTION: &str = "SELECT t.id, t.user_id, t.transaction_type, t.amount, \
     t.description, t.category_id, t.date, t.created_at, t.updated_at, \
     c.id, c.user_id, c.name, c.category_type, c.icon, c.color, c.created_at \
     FROM \"transaction\" t LEFT JOIN category c ON c.id = t.category_id";

/// Retrieve a single transaction owned by `user_id`, with its category
/// resolved.
pub fn get_transaction(
    transaction_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.id = :id AND t.user_id = :user_id;"
        ))?
        .query_row(
            &[(":id", &transaction_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Query for a user's transactions, with their categories resolved, ordered
/// by date descending and then most recently created first.
pub fn get_transactions(
    user_id: UserID,
    filter: TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut query_string_parts = vec![SELECT_TRANSACTION.to_string()];
    let mut where_clause_parts = vec!["t.user_id = ?1".to_string()];
    let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

    if let Some(date_range) = filter.date_range {
        where_clause_parts.push(format!(
            "t.date BETWEEN ?{} AND ?{}",
            query_parameters.len() + 1,
            query_parameters.len() + 2,
        ));
        query_parameters.push(Value::Text(date_range.start().to_string()));
        query_parameters.push(Value::Text(date_range.end().to_string()));
    }

    if let Some(transaction_type) = filter.transaction_type {
        where_clause_parts.push(format!(
            "t.transaction_type = ?{}",
            query_parameters.len() + 1
        ));
        query_parameters.push(Value::Text(transaction_type.as_str().to_string()));
    }

    if let Some(category_id) = filter.category_id {
        where_clause_parts.push(format!("t.category_id = ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Integer(category_id));
    }

    query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
    query_string_parts.push("ORDER BY t.date DESC, t.id DESC".to_string());

    if let Some(limit) = filter.limit {
        query_string_parts.push(format!("LIMIT {limit}"));
    }

    let query_string = query_string_parts.join(" ");
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the stored row for `transaction` with its current field values.
///
/// # Errors
///
/// Returns an [Error::UpdateMissingTransaction] if the transaction is not in
/// the database or belongs to another user.
pub fn update_transaction(transaction: &Transaction, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET transaction_type = ?1, amount = ?2, description = ?3, category_id = ?4,
             date = ?5, updated_at = ?6
         WHERE id = ?7 AND user_id = ?8;",
        (
            transaction.transaction_type.as_str(),
            transaction.amount.to_string(),
            &transaction.description,
            transaction.category_id,
            transaction.date,
            transaction.updated_at,
            transaction.id,
            transaction.user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::DeleteMissingTransaction] if the transaction is not in
/// the database or belongs to another user.
pub fn delete_transaction(
    transaction_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2;",
        (transaction_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Initialize the transaction table and indexes.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            transaction_type TEXT NOT NULL,
            amount TEXT NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date
            ON \"transaction\"(user_id, date);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);

    let raw_type: String = row.get(2)?;
    let transaction_type = raw_type.parse().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(error))
    })?;

    let raw_amount: String = row.get(3)?;
    let amount = raw_amount.parse().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(error))
    })?;

    let description = row.get(4)?;
    let category_id = row.get(5)?;
    let date = row.get(6)?;
    let created_at = row.get(7)?;
    let updated_at = row.get(8)?;

    let category = match row.get::<_, Option<DatabaseID>>(9)? {
        None => None,
        Some(category_row_id) => {
            let raw_name: String = row.get(11)?;
            let raw_category_type: String = row.get(12)?;
            let category_type = raw_category_type.parse().map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    12,
                    rusqlite::types::Type::Text,
                    Box::new(error),
                )
            })?;

            Some(Category {
                id: category_row_id,
                user_id: UserID::new(row.get(10)?),
                name: CategoryName::new_unchecked(&raw_name),
                category_type,
                icon: row.get(13)?,
                color: row.get(14)?,
                created_at: row.get(15)?,
            })
        }
    };

    Ok(Transaction {
        id,
        user_id,
        transaction_type,
        amount,
        description,
        category_id,
        date,
        created_at,
        updated_at,
        category,
    })
}

#[cfg(test)]
mod transaction_query_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        DatabaseID, Error,
        category::{CategoryName, db::create_category, db::delete_category},
        db::initialize,
        password::PasswordHash,
        transaction::TransactionType,
        user::{UserID, create_user},
    };

    use super::{
        NewTransaction, TransactionFilter, create_transaction, delete_transaction,
        get_transaction, get_transactions, update_transaction,
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

    fn make_transaction(
        amount: &str,
        transaction_type: TransactionType,
        date: time::Date,
        category_id: Option<DatabaseID>,
        user_id: UserID,
        connection: &Connection,
    ) -> crate::transaction::Transaction {
        create_transaction(
            NewTransaction {
                user_id,
                transaction_type,
                amount: amount.parse().unwrap(),
                description: "a test transaction".to_string(),
                category_id,
                date,
            },
            connection,
        )
        .expect("Could not create test transaction")
    }

    #[test]
    fn create_transaction_succeeds() {
        let (connection, user_id) = get_test_db_connection();

        let transaction = make_transaction(
            "123.45",
            TransactionType::Expense,
            date!(2025 - 01 - 15),
            None,
            user_id,
            &connection,
        );

        assert!(transaction.id > 0);
        assert_eq!(transaction.amount, "123.45".parse::<Decimal>().unwrap());
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert_eq!(transaction.date, date!(2025 - 01 - 15));
        assert_eq!(transaction.category, None);
        assert_eq!(transaction.updated_at, None);
    }

    #[test]
    fn create_transaction_resolves_category() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Food"),
            TransactionType::Expense,
            None,
            None,
            user_id,
            &connection,
        )
        .unwrap();

        let transaction = make_transaction(
            "50",
            TransactionType::Expense,
            date!(2025 - 01 - 15),
            Some(category.id),
            user_id,
            &connection,
        );

        assert_eq!(transaction.category, Some(category));
    }

    #[test]
    fn create_transaction_with_unknown_category_fails() {
        let (connection, user_id) = get_test_db_connection();

        let result = create_transaction(
            NewTransaction {
                user_id,
                transaction_type: TransactionType::Expense,
                amount: "50".parse().unwrap(),
                description: String::new(),
                category_id: Some(999),
                date: date!(2025 - 01 - 15),
            },
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory(Some(999))));
    }

    #[test]
    fn create_transaction_with_other_users_category_fails() {
        let (connection, user_id) = get_test_db_connection();
        let other_user = create_user(
            "other@test.com".parse().unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let category = create_category(
            CategoryName::new_unchecked("Theirs"),
            TransactionType::Expense,
            None,
            None,
            other_user.id,
            &connection,
        )
        .unwrap();

        let result = create_transaction(
            NewTransaction {
                user_id,
                transaction_type: TransactionType::Expense,
                amount: "50".parse().unwrap(),
                description: String::new(),
                category_id: Some(category.id),
                date: date!(2025 - 01 - 15),
            },
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory(Some(category.id))));
    }

    #[test]
    fn get_transaction_of_other_user_returns_not_found() {
        let (connection, user_id) = get_test_db_connection();
        let other_user = create_user(
            "other@test.com".parse().unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let transaction = make_transaction(
            "50",
            TransactionType::Expense,
            date!(2025 - 01 - 15),
            None,
            user_id,
            &connection,
        );

        let result = get_transaction(transaction.id, other_user.id, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_transactions_orders_by_date_descending() {
        let (connection, user_id) = get_test_db_connection();
        let oldest = make_transaction(
            "1",
            TransactionType::Expense,
            date!(2025 - 01 - 01),
            None,
            user_id,
            &connection,
        );
        let newest = make_transaction(
            "2",
            TransactionType::Expense,
            date!(2025 - 03 - 01),
            None,
            user_id,
            &connection,
        );
        let middle = make_transaction(
            "3",
            TransactionType::Expense,
            date!(2025 - 02 - 01),
            None,
            user_id,
            &connection,
        );

        let transactions =
            get_transactions(user_id, TransactionFilter::default(), &connection).unwrap();

        assert_eq!(transactions, vec![newest, middle, oldest]);
    }

    #[test]
    fn get_transactions_filters_by_date_range() {
        let (connection, user_id) = get_test_db_connection();
        make_transaction(
            "1",
            TransactionType::Expense,
            date!(2024 - 12 - 31),
            None,
            user_id,
            &connection,
        );
        let in_range = make_transaction(
            "2",
            TransactionType::Expense,
            date!(2025 - 01 - 15),
            None,
            user_id,
            &connection,
        );
        make_transaction(
            "3",
            TransactionType::Expense,
            date!(2025 - 02 - 01),
            None,
            user_id,
            &connection,
        );

        let filter = TransactionFilter {
            date_range: Some(date!(2025 - 01 - 01)..=date!(2025 - 01 - 31)),
            ..Default::default()
        };
        let transactions = get_transactions(user_id, filter, &connection).unwrap();

        assert_eq!(transactions, vec![in_range]);
    }

    #[test]
    fn get_transactions_filters_by_type_and_category() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Food"),
            TransactionType::Expense,
            None,
            None,
            user_id,
            &connection,
        )
        .unwrap();
        make_transaction(
            "1000",
            TransactionType::Income,
            date!(2025 - 01 - 05),
            None,
            user_id,
            &connection,
        );
        let groceries = make_transaction(
            "200",
            TransactionType::Expense,
            date!(2025 - 01 - 10),
            Some(category.id),
            user_id,
            &connection,
        );

        let by_type = get_transactions(
            user_id,
            TransactionFilter {
                transaction_type: Some(TransactionType::Expense),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();
        assert_eq!(by_type, vec![groceries.clone()]);

        let by_category = get_transactions(
            user_id,
            TransactionFilter {
                category_id: Some(category.id),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();
        assert_eq!(by_category, vec![groceries]);
    }

    #[test]
    fn get_transactions_excludes_other_users() {
        let (connection, user_id) = get_test_db_connection();
        let other_user = create_user(
            "other@test.com".parse().unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        make_transaction(
            "1",
            TransactionType::Expense,
            date!(2025 - 01 - 01),
            None,
            other_user.id,
            &connection,
        );
        let mine = make_transaction(
            "2",
            TransactionType::Expense,
            date!(2025 - 01 - 02),
            None,
            user_id,
            &connection,
        );

        let transactions =
            get_transactions(user_id, TransactionFilter::default(), &connection).unwrap();

        assert_eq!(transactions, vec![mine]);
    }

    #[test]
    fn get_transactions_applies_limit() {
        let (connection, user_id) = get_test_db_connection();
        for day in 1..=5 {
            make_transaction(
                "1",
                TransactionType::Expense,
                date!(2025 - 01 - 01).replace_day(day).unwrap(),
                None,
                user_id,
                &connection,
            );
        }

        let filter = TransactionFilter {
            limit: Some(3),
            ..Default::default()
        };
        let transactions = get_transactions(user_id, filter, &connection).unwrap();

        assert_eq!(transactions.len(), 3);
        assert_eq!(transactions[0].date, date!(2025 - 01 - 05));
    }

    #[test]
    fn update_transaction_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let mut transaction = make_transaction(
            "50",
            TransactionType::Expense,
            date!(2025 - 01 - 15),
            None,
            user_id,
            &connection,
        );

        transaction.amount = "75.50".parse().unwrap();
        transaction.description = "updated".to_string();
        transaction.updated_at = Some(time::OffsetDateTime::now_utc());
        update_transaction(&transaction, &connection).unwrap();

        let updated = get_transaction(transaction.id, user_id, &connection).unwrap();
        assert_eq!(updated.amount, "75.50".parse::<Decimal>().unwrap());
        assert_eq!(updated.description, "updated");
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn update_missing_transaction_fails() {
        let (connection, user_id) = get_test_db_connection();
        let mut transaction = make_transaction(
            "50",
            TransactionType::Expense,
            date!(2025 - 01 - 15),
            None,
            user_id,
            &connection,
        );
        transaction.id += 123;

        let result = update_transaction(&transaction, &connection);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_transaction_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let transaction = make_transaction(
            "50",
            TransactionType::Expense,
            date!(2025 - 01 - 15),
            None,
            user_id,
            &connection,
        );

        delete_transaction(transaction.id, user_id, &connection).unwrap();

        assert_eq!(
            get_transaction(transaction.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_missing_transaction_fails() {
        let (connection, user_id) = get_test_db_connection();

        let result = delete_transaction(999999, user_id, &connection);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn deleting_a_category_uncategorizes_its_transactions() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Food"),
            TransactionType::Expense,
            None,
            None,
            user_id,
            &connection,
        )
        .unwrap();
        let transaction = make_transaction(
            "50",
            TransactionType::Expense,
            date!(2025 - 01 - 15),
            Some(category.id),
            user_id,
            &connection,
        );

        delete_category(category.id, user_id, &connection).unwrap();

        let kept = get_transaction(transaction.id, user_id, &connection).unwrap();
        assert_eq!(kept.category_id, None);
        assert_eq!(kept.category, None);
        assert_eq!(kept.amount, transaction.amount);
    }
}
