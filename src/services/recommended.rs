//! Recommended friends: users from the same state the user does not follow yet.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait, sea_query::Expr,
};

use crate::auth::CurrentUser;
use crate::entities::{follow, recommended_friend, user, user_action};
use crate::error::ServiceResult;

const INSERT_CHUNK: usize = 500;

#[derive(Debug, Clone)]
pub struct RecommendedUser {
    pub friend: recommended_friend::Model,
    pub followers_count: u64,
    pub followings_count: u64,
    pub has_followed: bool,
    pub activities: u64,
}

/// Rebuild the whole table. Returns the number of suggestions written.
pub async fn rebuild(db: &DatabaseConnection) -> ServiceResult<usize> {
    let txn = db.begin().await?;
    recommended_friend::Entity::delete_many().exec(&txn).await?;

    let users = user::Entity::find()
        .filter(user::Column::IsBlocked.eq(false))
        .order_by_asc(user::Column::Id)
        .all(&txn)
        .await?;
    let followed: HashSet<(i32, i32)> = follow::Entity::find()
        .filter(follow::Column::IsFollowed.eq(true))
        .all(&txn)
        .await?
        .into_iter()
        .map(|f| (f.follower_id, f.followee_id))
        .collect();

    let mut by_state: HashMap<&str, Vec<&user::Model>> = HashMap::new();
    for u in &users {
        by_state.entry(u.state.as_str()).or_default().push(u);
    }

    let mut rows = Vec::new();
    for u in &users {
        let Some(neighbours) = by_state.get(u.state.as_str()) else {
            continue;
        };
        for candidate in neighbours {
            if candidate.id == u.id || followed.contains(&(u.id, candidate.id)) {
                continue;
            }
            rows.push(recommended_friend::ActiveModel {
                user_id: Set(u.id),
                recommended_user_id: Set(candidate.id),
                username: Set(candidate.username.clone()),
                first_name: Set(candidate.first_name.clone()),
                last_name: Set(candidate.last_name.clone()),
                image_url: Set(candidate.image_url.clone()),
                cover_image_url: Set(candidate.cover_image_url.clone()),
                ..Default::default()
            });
        }
    }

    let written = rows.len();
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        let chunk: Vec<_> = rows.by_ref().take(INSERT_CHUNK).collect();
        recommended_friend::Entity::insert_many(chunk).exec(&txn).await?;
    }

    txn.commit().await?;
    tracing::info!(written, "recommended friends rebuilt");
    Ok(written)
}

/// Active follow rows per user, keyed by `side` (followee for followers, follower for followings).
async fn follow_counts(
    db: &DatabaseConnection,
    side: follow::Column,
    ids: &[i32],
) -> ServiceResult<HashMap<i32, u64>> {
    let rows = follow::Entity::find()
        .select_only()
        .column(side)
        .column_as(Expr::col(follow::Column::Id).count(), "total")
        .filter(side.is_in(ids.to_vec()))
        .filter(follow::Column::IsFollowed.eq(true))
        .group_by(side)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|(id, n)| (id, n as u64)).collect())
}

async fn activity_counts(db: &DatabaseConnection, ids: &[i32]) -> ServiceResult<HashMap<i32, u64>> {
    let rows = user_action::Entity::find()
        .select_only()
        .column(user_action::Column::UserId)
        .column_as(Expr::col(user_action::Column::Id).count(), "total")
        .filter(user_action::Column::UserId.is_in(ids.to_vec()))
        .group_by(user_action::Column::UserId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|(id, n)| (id, n as u64)).collect())
}

pub async fn recommended_users(
    db: &DatabaseConnection,
    user: &CurrentUser,
    search: Option<&str>,
) -> ServiceResult<Vec<RecommendedUser>> {
    let mut query = recommended_friend::Entity::find()
        .filter(recommended_friend::Column::UserId.eq(user.id));
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(recommended_friend::Column::Username.contains(term))
                .add(recommended_friend::Column::FirstName.contains(term))
                .add(recommended_friend::Column::LastName.contains(term)),
        );
    }
    let friends = query
        .order_by_asc(recommended_friend::Column::Username)
        .all(db)
        .await?;

    let ids: Vec<i32> = friends.iter().map(|f| f.recommended_user_id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let followers = follow_counts(db, follow::Column::FolloweeId, &ids).await?;
    let followings = follow_counts(db, follow::Column::FollowerId, &ids).await?;
    let activities = activity_counts(db, &ids).await?;
    let followed: HashSet<i32> = follow::Entity::find()
        .select_only()
        .column(follow::Column::FolloweeId)
        .filter(follow::Column::FollowerId.eq(user.id))
        .filter(follow::Column::FolloweeId.is_in(ids))
        .filter(follow::Column::IsFollowed.eq(true))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(friends
        .into_iter()
        .map(|friend| {
            let id = friend.recommended_user_id;
            RecommendedUser {
                followers_count: followers.get(&id).copied().unwrap_or(0),
                followings_count: followings.get(&id).copied().unwrap_or(0),
                has_followed: followed.contains(&id),
                activities: activities.get(&id).copied().unwrap_or(0),
                friend,
            }
        })
        .collect())
}
