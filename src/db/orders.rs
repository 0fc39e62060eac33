use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::models::orders::{self, CreateOrder, Status};

/// Insert a new order in `created` status with all latches down.
pub async fn insert_order(
    db: &DatabaseConnection,
    client_id: Uuid,
    input: CreateOrder,
) -> Result<orders::Model, DbErr> {
    let new_order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        task: Set(input.task),
        client_id: Set(client_id),
        contractor_id: Set(None),
        status: Set(Status::Created),
        created_at: Set(Utc::now()),
        assigned_at: Set(None),
        closed_at: Set(None),
        not_taken_manager_informed: Set(false),
        late_work_manager_informed: Set(false),
        in_work_client_informed: Set(false),
        closed_client_informed: Set(false),
        reserved_contractors_informed: Set(false),
        all_contractors_informed: Set(false),
        creds: Set(Some(input.creds)),
        estimated_hours: Set(None),
    };

    new_order.insert(db).await
}

/// Fetch a single order by ID.
pub async fn get_order_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<orders::Model>, DbErr> {
    orders::Entity::find_by_id(id).one(db).await
}

/// Fetch orders newest first, optionally narrowed to one status.
pub async fn get_orders(
    db: &DatabaseConnection,
    status: Option<Status>,
) -> Result<Vec<orders::Model>, DbErr> {
    let mut query = orders::Entity::find().order_by_desc(orders::Column::CreatedAt);
    if let Some(status) = status {
        query = query.filter(orders::Column::Status.eq(status));
    }
    query.all(db).await
}

/// Does the client have an order in `created` or `in_work`? One active order
/// per client at a time.
pub async fn has_active_order(db: &DatabaseConnection, client_id: Uuid) -> Result<bool, DbErr> {
    let count = orders::Entity::find()
        .filter(orders::Column::ClientId.eq(client_id))
        .filter(orders::Column::Status.is_in([Status::Created, Status::InWork]))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// The client's single non-terminal order, if any.
pub async fn active_order_of_client(
    db: &DatabaseConnection,
    client_id: Uuid,
) -> Result<Option<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::ClientId.eq(client_id))
        .filter(orders::Column::Status.is_in([Status::Created, Status::InWork]))
        .one(db)
        .await
}

/// Number of the client's non-cancelled orders created since the given
/// billing-cycle start. Cancelled orders never count toward the quota.
pub async fn count_billable_since(
    db: &DatabaseConnection,
    client_id: Uuid,
    since: DateTime<Utc>,
) -> Result<u64, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::ClientId.eq(client_id))
        .filter(orders::Column::Status.ne(Status::Cancelled))
        .filter(orders::Column::CreatedAt.gte(since))
        .count(db)
        .await
}

/// Open orders a contractor could pick up, oldest first.
pub async fn available_orders(db: &DatabaseConnection) -> Result<Vec<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::Status.eq(Status::Created))
        .order_by_asc(orders::Column::CreatedAt)
        .all(db)
        .await
}

/// Orders a contractor currently holds in work.
pub async fn contractor_orders_in_work(
    db: &DatabaseConnection,
    contractor_id: Uuid,
) -> Result<Vec<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::ContractorId.eq(contractor_id))
        .filter(orders::Column::Status.eq(Status::InWork))
        .all(db)
        .await
}

/// Distinct contractors currently holding an order in work.
pub async fn busy_contractor_ids(db: &DatabaseConnection) -> Result<Vec<Uuid>, DbErr> {
    let ids: Vec<Option<Uuid>> = orders::Entity::find()
        .select_only()
        .column(orders::Column::ContractorId)
        .filter(orders::Column::Status.eq(Status::InWork))
        .distinct()
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().flatten().collect())
}

/// The client's most recently closed order, if any (reservation source).
pub async fn last_closed_order(
    db: &DatabaseConnection,
    client_id: Uuid,
) -> Result<Option<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::ClientId.eq(client_id))
        .filter(orders::Column::Status.eq(Status::Closed))
        .filter(orders::Column::ContractorId.is_not_null())
        .order_by_desc(orders::Column::ClosedAt)
        .one(db)
        .await
}

/// Distinct contractors who ever worked a closed order for this client.
pub async fn contractor_ids_of_closed_orders(
    db: &DatabaseConnection,
    client_id: Uuid,
) -> Result<Vec<Uuid>, DbErr> {
    let ids: Vec<Option<Uuid>> = orders::Entity::find()
        .select_only()
        .column(orders::Column::ContractorId)
        .filter(orders::Column::ClientId.eq(client_id))
        .filter(orders::Column::Status.eq(Status::Closed))
        .distinct()
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().flatten().collect())
}

/// Count of orders in one status (owner census).
pub async fn count_by_status(db: &DatabaseConnection, status: Status) -> Result<u64, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::Status.eq(status))
        .count(db)
        .await
}

// ── Lifecycle writes ──
//
// Every transition is a single UPDATE conditioned on the status the move is
// legal from. Two racing writers produce one row change and one zero-row
// result; the caller turns the latter into an InvalidTransition. No partial
// field write is ever visible.

/// created → in_work: set the contractor and assignment time, drop both
/// manager latches and any stale estimate. Returns whether a row changed.
pub async fn take_in_work(
    db: &DatabaseConnection,
    order_id: Uuid,
    contractor_id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let patch = orders::ActiveModel {
        contractor_id: Set(Some(contractor_id)),
        assigned_at: Set(Some(now)),
        status: Set(Status::InWork),
        not_taken_manager_informed: Set(false),
        late_work_manager_informed: Set(false),
        estimated_hours: Set(None),
        ..Default::default()
    };

    let result = orders::Entity::update_many()
        .set(patch)
        .filter(orders::Column::Id.eq(order_id))
        .filter(orders::Column::Status.eq(Status::Created))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// in_work → closed: stamp the completion time and erase stored credentials.
pub async fn close_work(
    db: &DatabaseConnection,
    order_id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let patch = orders::ActiveModel {
        status: Set(Status::Closed),
        closed_at: Set(Some(now)),
        creds: Set(None),
        ..Default::default()
    };

    let result = orders::Entity::update_many()
        .set(patch)
        .filter(orders::Column::Id.eq(order_id))
        .filter(orders::Column::Status.eq(Status::InWork))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// {created, in_work} → cancelled: stamp the time and erase credentials.
pub async fn cancel_work(
    db: &DatabaseConnection,
    order_id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let patch = orders::ActiveModel {
        status: Set(Status::Cancelled),
        closed_at: Set(Some(now)),
        creds: Set(None),
        ..Default::default()
    };

    let result = orders::Entity::update_many()
        .set(patch)
        .filter(orders::Column::Id.eq(order_id))
        .filter(orders::Column::Status.is_in([Status::Created, Status::InWork]))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Record the contractor's completion estimate on their own in-work order.
pub async fn set_estimate(
    db: &DatabaseConnection,
    order_id: Uuid,
    contractor_id: Uuid,
    hours: i32,
) -> Result<bool, DbErr> {
    let result = orders::Entity::update_many()
        .col_expr(orders::Column::EstimatedHours, Expr::value(Some(hours)))
        .filter(orders::Column::Id.eq(order_id))
        .filter(orders::Column::ContractorId.eq(contractor_id))
        .filter(orders::Column::Status.eq(Status::InWork))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Return every in-work order of an off-boarded contractor to the open pool:
/// back to `created`, assignment fields and estimate cleared, the manager
/// latches and the taken-notice latch dropped so the sweeps fire again.
pub async fn release_contractor_orders(
    db: &DatabaseConnection,
    contractor_id: Uuid,
) -> Result<u64, DbErr> {
    let patch = orders::ActiveModel {
        status: Set(Status::Created),
        contractor_id: Set(None),
        assigned_at: Set(None),
        estimated_hours: Set(None),
        not_taken_manager_informed: Set(false),
        late_work_manager_informed: Set(false),
        in_work_client_informed: Set(false),
        ..Default::default()
    };

    let result = orders::Entity::update_many()
        .set(patch)
        .filter(orders::Column::ContractorId.eq(contractor_id))
        .filter(orders::Column::Status.eq(Status::InWork))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

// ── Sweep queries and latch writes ──

/// Candidates for the not-taken sweep: still open, managers not yet told.
pub async fn not_taken_candidates(db: &DatabaseConnection) -> Result<Vec<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::Status.eq(Status::Created))
        .filter(orders::Column::NotTakenManagerInformed.eq(false))
        .all(db)
        .await
}

/// Candidates for the not-closed sweep: in work, managers not yet told.
pub async fn not_closed_candidates(db: &DatabaseConnection) -> Result<Vec<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::Status.eq(Status::InWork))
        .filter(orders::Column::LateWorkManagerInformed.eq(false))
        .all(db)
        .await
}

/// Orders whose contractor fan-out is not finished yet.
pub async fn fanout_candidates(db: &DatabaseConnection) -> Result<Vec<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::Status.eq(Status::Created))
        .filter(orders::Column::AllContractorsInformed.eq(false))
        .order_by_asc(orders::Column::CreatedAt)
        .all(db)
        .await
}

/// Taken orders whose client has not been told yet.
pub async fn in_work_not_client_informed(
    db: &DatabaseConnection,
) -> Result<Vec<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::Status.eq(Status::InWork))
        .filter(orders::Column::InWorkClientInformed.eq(false))
        .all(db)
        .await
}

/// Closed orders whose client has not been told yet.
pub async fn closed_not_client_informed(
    db: &DatabaseConnection,
) -> Result<Vec<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::Status.eq(Status::Closed))
        .filter(orders::Column::ClosedClientInformed.eq(false))
        .all(db)
        .await
}

/// Latch a whole warned batch after the manager fan-out went out.
pub async fn mark_not_taken_informed(db: &DatabaseConnection, ids: &[Uuid]) -> Result<(), DbErr> {
    if ids.is_empty() {
        return Ok(());
    }
    orders::Entity::update_many()
        .col_expr(orders::Column::NotTakenManagerInformed, Expr::value(true))
        .filter(orders::Column::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(())
}

/// Latch a whole late batch after the manager fan-out went out.
pub async fn mark_late_work_informed(db: &DatabaseConnection, ids: &[Uuid]) -> Result<(), DbErr> {
    if ids.is_empty() {
        return Ok(());
    }
    orders::Entity::update_many()
        .col_expr(orders::Column::LateWorkManagerInformed, Expr::value(true))
        .filter(orders::Column::Id.is_in(ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(())
}

/// Latch the taken-notice for one order.
pub async fn mark_in_work_client_informed(db: &DatabaseConnection, id: Uuid) -> Result<(), DbErr> {
    orders::Entity::update_many()
        .col_expr(orders::Column::InWorkClientInformed, Expr::value(true))
        .filter(orders::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Latch the closed-notice for one order.
pub async fn mark_closed_client_informed(db: &DatabaseConnection, id: Uuid) -> Result<(), DbErr> {
    orders::Entity::update_many()
        .col_expr(orders::Column::ClosedClientInformed, Expr::value(true))
        .filter(orders::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Latch the fan-out progress for one order. The reserved latch is always set
/// together with the all latch — once everyone was told there is no reserved
/// subset left to distinguish.
pub async fn mark_fanout_informed(
    db: &DatabaseConnection,
    id: Uuid,
    all_informed: bool,
) -> Result<(), DbErr> {
    let mut update = orders::Entity::update_many().col_expr(
        orders::Column::ReservedContractorsInformed,
        Expr::value(true),
    );
    if all_informed {
        update = update.col_expr(orders::Column::AllContractorsInformed, Expr::value(true));
    }
    update
        .filter(orders::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}
