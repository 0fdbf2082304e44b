use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flickbook_core::repository::{BookingRepository, RepoResult};
use flickbook_shared::{Booking, BookingChanges, NewBooking};
use sqlx::PgPool;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str =
    "id, movie_title, show_date, showtime, showtime_available, quantity, booked_by, created_at";

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    movie_title: String,
    show_date: String,
    showtime: String,
    showtime_available: Option<i32>,
    quantity: i32,
    booked_by: String,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            movie_title: row.movie_title,
            show_date: row.show_date,
            showtime: row.showtime,
            showtime_available: row.showtime_available,
            quantity: row.quantity,
            booked_by: row.booked_by,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &NewBooking) -> RepoResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO bookings (movie_title, show_date, showtime, showtime_available, quantity, booked_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(&booking.movie_title)
        .bind(&booking.show_date)
        .bind(&booking.showtime)
        .bind(booking.showtime_available)
        .bind(booking.quantity)
        .bind(&booking.booked_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_booking(&self, id: i64) -> RepoResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn list_bookings(&self) -> RepoResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn list_bookings_for(&self, username: &str) -> RepoResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booked_by = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn find_matching(&self, booking: &NewBooking) -> RepoResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE movie_title = $1 AND show_date = $2 AND showtime = $3 AND booked_by = $4 AND quantity = $5
            ORDER BY id
            LIMIT 1
            "#
        ))
        .bind(&booking.movie_title)
        .bind(&booking.show_date)
        .bind(&booking.showtime)
        .bind(&booking.booked_by)
        .bind(booking.quantity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn update_booking(&self, id: i64, changes: &BookingChanges) -> RepoResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET show_date = COALESCE($1, show_date),
                showtime = COALESCE($2, showtime),
                showtime_available = COALESCE($3, showtime_available),
                quantity = COALESCE($4, quantity)
            WHERE id = $5
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(&changes.show_date)
        .bind(&changes.showtime)
        .bind(changes.showtime_available)
        .bind(changes.quantity)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn delete_booking(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
