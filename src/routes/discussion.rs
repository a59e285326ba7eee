use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::email::discussion::{NewCommentEmail, NewReplyEmail};
use crate::email::send_email;
use crate::error::{PickupError, PickupResult};
use crate::extract::JsonBody;
use crate::models::discussion::{Comment, CommentForm, Discussion};
use crate::routes::{for_email, AppState};
use crate::util::{current_time, parse_id};

pub async fn add_comment(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    AuthUser(author): AuthUser,
    JsonBody(form): JsonBody<CommentForm>,
) -> PickupResult<(StatusCode, Json<Comment>)> {
    let id = parse_id(&id, "Discussion not found.")?;
    let discussion = Discussion::with_id(id, state.db.as_ref()).await?;
    let text = form.text("Comment text is required.")?;

    let comment = Comment::new(text, author.id, discussion.id, None, current_time());
    let comment = state.db.create_comment(comment).await?;

    // the host hears about comments on their event, except their own
    if let Some(event) = for_email(state.db.event_with_id(discussion.event_id)).await {
        if event.host_id != author.id {
            if let Some(host) = for_email(state.db.user_with_id(event.host_id)).await {
                send_email(
                    state.mailer.as_ref(),
                    NewCommentEmail::new(&host, &author, &event, &comment),
                )
                .await;
            }
        }
    }

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn reply(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    AuthUser(replier): AuthUser,
    JsonBody(form): JsonBody<CommentForm>,
) -> PickupResult<(StatusCode, Json<Comment>)> {
    let text = form.text("Reply text is required.")?;
    let id = parse_id(&id, "Comment not found.")?;
    let parent = Comment::with_id(id, state.db.as_ref()).await?;

    let reply = parent.reply(text, replier.id, current_time());
    let reply = state.db.create_comment(reply).await?;

    if parent.user_id != replier.id {
        let parent_author = for_email(state.db.user_with_id(parent.user_id)).await;
        let discussion = for_email(state.db.discussion_with_id(parent.discussion_id)).await;
        let event = match discussion {
            Some(discussion) => for_email(state.db.event_with_id(discussion.event_id)).await,
            None => None,
        };

        if let (Some(parent_author), Some(event)) = (parent_author, event) {
            if parent_author.discussion_reply_notification {
                send_email(
                    state.mailer.as_ref(),
                    NewReplyEmail::new(&parent_author, &parent, &replier, &event, &reply),
                )
                .await;
            }
        }
    }

    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn delete_comment(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> PickupResult<Json<Value>> {
    let id = parse_id(&id, "Comment not found.")?;
    let comment = Comment::with_id(id, state.db.as_ref()).await?;
    if comment.user_id != user.id() {
        return Err(PickupError::forbidden(
            "You are not the author of this comment.",
        ));
    }

    state.db.delete_comment(comment.id).await?;

    Ok(Json(json!({ "message": "Comment successfully deleted." })))
}
