use base64::decode;
use bcrypt::verify;
use log::error;
use sqlx::AnyPool;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::oneshot;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::error::{Error, Result};
use crate::model::form::{Action, EntryForm};
use crate::model::{db, view};
use crate::templates;

pub fn filter(
    db_pool: AnyPool,
    th_pool: Arc<rayon::ThreadPool>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let auth = basic_auth_filter(db_pool.clone(), th_pool);

    let blog = warp::path::end()
        .and(warp::get())
        .and(with_db(db_pool.clone()))
        .and_then(|pool: AnyPool| async move {
            blog_page(pool).await.map_err(Error::into_rejection)
        });

    let dashboard = warp::path!("dashboard")
        .and(warp::get())
        .and(auth.clone())
        .and(with_db(db_pool.clone()))
        .and_then(|_user: String, pool: AnyPool| async move {
            dashboard_page(pool).await.map_err(Error::into_rejection)
        });

    let new_form = warp::path!("dashboard" / "new")
        .and(warp::get())
        .and(auth.clone())
        .and_then(|_user: String| async move { Ok::<_, Rejection>(new_entry_page()) });

    // request-size guard only, the text field itself is unbounded
    let create = warp::path!("dashboard" / "new")
        .and(warp::post())
        .and(auth.clone())
        .and(warp::body::content_length_limit(1024 * 1024))
        .and(warp::body::form::<EntryForm>())
        .and(with_db(db_pool.clone()))
        .and_then(|_user: String, form: EntryForm, pool: AnyPool| async move {
            create_entry(pool, form).await.map_err(Error::into_rejection)
        });

    let edit_form = warp::path!("dashboard" / i64 / "edit")
        .and(warp::get())
        .and(auth.clone())
        .and(with_db(db_pool.clone()))
        .and_then(|id: i64, _user: String, pool: AnyPool| async move {
            edit_entry_page(pool, id).await.map_err(Error::into_rejection)
        });

    let update = warp::path!("dashboard" / i64 / "edit")
        .and(warp::post())
        .and(auth)
        .and(warp::body::content_length_limit(1024 * 1024))
        .and(warp::body::form::<EntryForm>())
        .and(with_db(db_pool))
        .and_then(
            |id: i64, _user: String, form: EntryForm, pool: AnyPool| async move {
                update_entry(pool, id, form)
                    .await
                    .map_err(Error::into_rejection)
            },
        );

    blog.or(dashboard)
        .unify()
        .or(new_form)
        .unify()
        .or(create)
        .unify()
        .or(edit_form)
        .unify()
        .or(update)
        .unify()
        .recover(handle_rejection)
}

fn with_db(pool: AnyPool) -> impl Filter<Extract = (AnyPool,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

async fn list_entries(pool: &AnyPool) -> Result<Vec<view::Entry>> {
    let rows = sqlx::query_as::<_, db::Entry>(
        "SELECT id, title, text, created, published FROM entry ORDER BY created ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(view::Entry::from).collect())
}

async fn fetch_entry(pool: &AnyPool, id: i64) -> Result<db::Entry> {
    sqlx::query_as::<_, db::Entry>(
        "SELECT id, title, text, created, published FROM entry WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(Error::NotFound)
}

async fn blog_page(pool: AnyPool) -> Result<Response> {
    let entries = list_entries(&pool).await?;
    Ok(warp::reply::html(templates::blog_page(&entries)).into_response())
}

async fn dashboard_page(pool: AnyPool) -> Result<Response> {
    let entries = list_entries(&pool).await?;
    Ok(warp::reply::html(templates::dashboard_page(&entries)).into_response())
}

fn new_entry_page() -> Response {
    warp::reply::html(templates::entry_form_page(None, "", "", &[])).into_response()
}

async fn edit_entry_page(pool: AnyPool, id: i64) -> Result<Response> {
    let entry = fetch_entry(&pool, id).await?;

    Ok(
        warp::reply::html(templates::entry_form_page(
            Some(entry.id),
            &entry.title,
            &entry.text,
            &[],
        ))
        .into_response(),
    )
}

async fn create_entry(pool: AnyPool, form: EntryForm) -> Result<Response> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(form_with_errors(None, &form, &errors));
    }

    sqlx::query("INSERT INTO entry (title, text, created) VALUES ($1, $2, $3)")
        .bind(form.title)
        .bind(form.text)
        .bind(db::now())
        .execute(&pool)
        .await?;

    Ok(see_other("/dashboard"))
}

async fn update_entry(pool: AnyPool, id: i64, form: EntryForm) -> Result<Response> {
    let entry = fetch_entry(&pool, id).await?;

    match form.action() {
        Action::Delete => {
            sqlx::query("DELETE FROM entry WHERE id = $1")
                .bind(id)
                .execute(&pool)
                .await?;
        }
        action => {
            let errors = form.validate();
            if !errors.is_empty() {
                return Ok(form_with_errors(Some(id), &form, &errors));
            }

            // created is deliberately absent from the column list
            sqlx::query("UPDATE entry SET title = $1, text = $2 WHERE id = $3")
                .bind(form.title)
                .bind(form.text)
                .bind(id)
                .execute(&pool)
                .await?;

            if action == Action::Publish && entry.published.is_none() {
                sqlx::query("UPDATE entry SET published = $1 WHERE id = $2")
                    .bind(db::now())
                    .bind(id)
                    .execute(&pool)
                    .await?;
            }
        }
    }

    Ok(see_other("/dashboard"))
}

fn see_other(location: &'static str) -> Response {
    warp::reply::with_header(
        warp::reply::with_status(warp::reply::reply(), StatusCode::SEE_OTHER),
        "location",
        location,
    )
    .into_response()
}

fn form_with_errors(id: Option<i64>, form: &EntryForm, errors: &[&str]) -> Response {
    warp::reply::with_status(
        warp::reply::html(templates::entry_form_page(id, &form.title, &form.text, errors)),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .into_response()
}

async fn handle_rejection(err: Rejection) -> std::result::Result<Response, Rejection> {
    if let Some(e) = err.find::<Error>() {
        let response = match e {
            Error::Unauthorized | Error::HeaderDecode => warp::reply::with_header(
                warp::reply::with_status(
                    warp::reply::html(templates::status_page("Unauthorized")),
                    StatusCode::UNAUTHORIZED,
                ),
                "WWW-Authenticate",
                "Basic realm=\"dashboard\"",
            )
            .into_response(),
            Error::NotFound => warp::reply::with_status(
                warp::reply::html(templates::status_page("Not Found")),
                StatusCode::NOT_FOUND,
            )
            .into_response(),
            e => {
                error!("unhandled error: {}", e);
                warp::reply::with_status(
                    warp::reply::html(templates::status_page("Internal Server Error")),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
                .into_response()
            }
        };
        Ok(response)
    } else {
        Err(err)
    }
}

fn basic_auth_filter(
    db_pool: AnyPool,
    th_pool: Arc<rayon::ThreadPool>,
) -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    // `optional` instead of a required header so that a missing header still
    // reaches our rejection handler and gets the browser challenge
    warp::header::optional::<String>("authorization")
        .map(|header: Option<String>| {
            header
                .as_deref()
                .and_then(|s| s.strip_prefix("Basic "))
                .and_then(|s| decode(s).ok())
                .and_then(|vec| String::from_utf8(vec).ok())
        })
        .and_then(move |header: Option<String>| {
            let db_pool = db_pool.clone();
            let th_pool = th_pool.clone();
            async move {
                match basic_auth(db_pool, th_pool, header).await {
                    Ok(username) => Ok(username),
                    Err(e) => Err(e.into_rejection()),
                }
            }
        })
}

async fn basic_auth(
    pool: AnyPool,
    thread_pool: Arc<rayon::ThreadPool>,
    header: Option<String>,
) -> Result<String> {
    let s = header.ok_or(Error::HeaderDecode)?;

    let mut it = s.splitn(2, ':');

    #[derive(Debug, sqlx::FromRow)]
    struct User {
        pw_hash: String,
    }

    match (it.next(), it.next()) {
        (Some(username), Some(password)) => {
            match sqlx::query_as::<_, User>("SELECT u.pw_hash FROM \"user\" u WHERE username = $1")
                .bind(username.to_string())
                .fetch_optional(&pool)
                .await
            {
                Err(e) => Err(Error::DbError(e)),
                Ok(None) => Err(Error::Unauthorized),
                Ok(Some(user)) => {
                    let password = password.to_string();
                    let (tx, rx) = oneshot::channel();

                    thread_pool.spawn(move || check_password(password, user.pw_hash, tx));

                    match rx.await {
                        Ok(true) => Ok(username.to_string()),
                        Ok(false) => Err(Error::Unauthorized),
                        Err(_) => Err(Error::Unknown),
                    }
                }
            }
        }
        _ => Err(Error::HeaderDecode),
    }
}

fn check_password(password: String, pw_hash: String, tx: oneshot::Sender<bool>) {
    if !tx.is_closed() {
        tx.send(verify(password, &pw_hash).unwrap_or(false)).ok();
    }
}
