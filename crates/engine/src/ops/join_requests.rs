use chrono::Utc;
use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, JoinRequest, JoinRequestFilter, JoinRequestStatus, Page, PageRequest,
    ResultEngine, access, join_requests,
};

use super::{Engine, with_tx};

const JOIN_REQUEST_SORTS: &[&str] = &["-created_at", "created_at"];

fn apply_status(
    query: Select<join_requests::Entity>,
    status: Option<JoinRequestStatus>,
) -> Select<join_requests::Entity> {
    match status {
        None => query,
        Some(JoinRequestStatus::Pending) => query
            .filter(join_requests::Column::IsApproved.eq(false))
            .filter(join_requests::Column::IsRejected.eq(false)),
        Some(JoinRequestStatus::Approved) => {
            query.filter(join_requests::Column::IsApproved.eq(true))
        }
        Some(JoinRequestStatus::Rejected) => {
            query.filter(join_requests::Column::IsRejected.eq(true))
        }
    }
}

impl Engine {
    async fn load_join_request<C: ConnectionTrait>(
        &self,
        db: &C,
        request_id: Uuid,
    ) -> ResultEngine<JoinRequest> {
        let model = join_requests::Entity::find_by_id(request_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("join request not exists".to_string()))?;
        JoinRequest::try_from(model)
    }

    /// Ask the owner of `pocket_id` for access.
    pub async fn create_join_request(
        &self,
        requester_id: &str,
        pocket_id: Uuid,
    ) -> ResultEngine<JoinRequest> {
        let request = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, requester_id).await?;
            let pocket = self.load_pocket(&db_tx, pocket_id).await?;
            if access::can_read(&pocket, requester_id) {
                return Err(EngineError::Conflict(
                    "already a member of this pocket".to_string(),
                ));
            }
            let pending = apply_status(
                join_requests::Entity::find()
                    .filter(join_requests::Column::RequesterId.eq(requester_id.to_string()))
                    .filter(join_requests::Column::PocketId.eq(pocket_id.to_string())),
                Some(JoinRequestStatus::Pending),
            )
            .one(&db_tx)
            .await?;
            if pending.is_some() {
                return Err(EngineError::Conflict(
                    "a pending join request already exists".to_string(),
                ));
            }

            let now = Utc::now();
            let request = JoinRequest {
                id: self.next_id(),
                requester_id: requester_id.to_string(),
                pocket_id,
                pocket_name: pocket.name.clone(),
                approver_id: pocket.owner_id.clone(),
                is_approved: false,
                is_rejected: false,
                created_at: now,
                updated_at: now,
            };
            join_requests::ActiveModel::from(&request)
                .insert(&db_tx)
                .await?;
            Ok(request)
        })?;

        self.notify(
            vec![request.approver_id.clone()],
            "Join request",
            format!("{} wants to join \"{}\"", request.requester_id, request.pocket_name),
        );
        Ok(request)
    }

    /// Settle a pending request. Approval grants editor and watcher access.
    ///
    /// The pending-to-final transition is a guarded update, so two racing
    /// decisions cannot both apply.
    pub async fn approve_or_reject(
        &self,
        actor_id: &str,
        request_id: Uuid,
        approve: bool,
    ) -> ResultEngine<JoinRequest> {
        let request = with_tx!(self, |db_tx| {
            let mut request = self.load_join_request(&db_tx, request_id).await?;
            if request.approver_id != actor_id {
                return Err(EngineError::Forbidden(
                    "only the approver can decide on a join request".to_string(),
                ));
            }
            if request.is_terminal() {
                return Err(EngineError::Conflict(
                    "join request already processed".to_string(),
                ));
            }

            let now = Utc::now();
            let settled = join_requests::Entity::update_many()
                .col_expr(join_requests::Column::IsApproved, Expr::value(approve))
                .col_expr(join_requests::Column::IsRejected, Expr::value(!approve))
                .col_expr(join_requests::Column::UpdatedAt, Expr::value(now))
                .filter(join_requests::Column::Id.eq(request_id.to_string()))
                .filter(join_requests::Column::IsApproved.eq(false))
                .filter(join_requests::Column::IsRejected.eq(false))
                .exec(&db_tx)
                .await?;
            if settled.rows_affected == 0 {
                return Err(EngineError::Conflict(
                    "join request already processed".to_string(),
                ));
            }

            if approve {
                let mut pocket = self.load_pocket(&db_tx, request.pocket_id).await?;
                pocket.editor_ids.insert(request.requester_id.clone());
                pocket.watcher_ids.insert(request.requester_id.clone());
                self.save_pocket(&db_tx, &mut pocket).await?;
                self.insert_member_row(&db_tx, pocket.id, &request.requester_id)
                    .await?;
            }

            request.is_approved = approve;
            request.is_rejected = !approve;
            request.updated_at = now;
            Ok(request)
        })?;

        tracing::info!(%request_id, approved = approve, "join request settled");
        let outcome = if approve { "approved" } else { "rejected" };
        self.notify(
            vec![request.requester_id.clone()],
            "Join request",
            format!("Your request to join \"{}\" was {outcome}", request.pocket_name),
        );
        Ok(request)
    }

    /// Requests waiting on (or decided by) `user_id`.
    pub async fn find_all_join_request_by_approver(
        &self,
        user_id: &str,
        filter: &JoinRequestFilter,
        page: &PageRequest,
    ) -> ResultEngine<Page<JoinRequest>> {
        let query = join_requests::Entity::find()
            .filter(join_requests::Column::ApproverId.eq(user_id.to_string()));
        self.page_join_requests(query, filter, page).await
    }

    /// Requests `user_id` has sent.
    pub async fn find_all_join_request_by_requester(
        &self,
        user_id: &str,
        filter: &JoinRequestFilter,
        page: &PageRequest,
    ) -> ResultEngine<Page<JoinRequest>> {
        let query = join_requests::Entity::find()
            .filter(join_requests::Column::RequesterId.eq(user_id.to_string()));
        self.page_join_requests(query, filter, page).await
    }

    async fn page_join_requests(
        &self,
        query: Select<join_requests::Entity>,
        filter: &JoinRequestFilter,
        page: &PageRequest,
    ) -> ResultEngine<Page<JoinRequest>> {
        let spec = page.resolve(JOIN_REQUEST_SORTS)?;
        let db = &self.database;
        let query = apply_status(query, filter.status);
        let total = query.clone().count(db).await?;
        let models = query
            .order_by(join_requests::Column::CreatedAt, spec.direction.order())
            .order_by(join_requests::Column::Id, spec.direction.order())
            .offset(spec.offset())
            .limit(spec.page_size)
            .all(db)
            .await?;
        let items = models
            .into_iter()
            .map(JoinRequest::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(Page::new(items, &spec, total))
    }
}
