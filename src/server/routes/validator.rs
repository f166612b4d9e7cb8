use actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use serde::Deserialize;

use crate::{
    database::models::NewValidator,
    ledger::Ledger,
    server::{error::LedgerServerError, with_ledger, RuntimeContext},
};

#[derive(Debug, Deserialize)]
pub struct PostValidatorBody {
    address: String,
    #[serde(default)]
    url: Option<String>,
}

pub async fn post_validator<Context>(
    ctx: Data<Context>,
    body: Json<PostValidatorBody>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let body = body.into_inner();
    let new_validator = NewValidator {
        address: body.address,
        url: body.url,
    };

    let v = with_ledger(ctx, move |ledger| ledger.create_validator(new_validator)).await?;
    Ok(HttpResponse::Created().json(v))
}

pub async fn get_validators<Context>(
    ctx: Data<Context>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let validators = with_ledger(ctx, |ledger| ledger.validators()).await?;
    Ok(HttpResponse::Ok().json(validators))
}

pub async fn get_validator<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let (address,) = path.into_inner();
    let v = with_ledger(ctx, move |ledger| ledger.get_validator(&address)).await?;
    Ok(HttpResponse::Ok().json(v))
}

pub async fn delete_validator<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let (address,) = path.into_inner();
    with_ledger(ctx, move |ledger| ledger.delete_validator(&address)).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::{header::ContentType, StatusCode},
        test::{call_service, init_service, read_body_json, TestRequest},
        web::Data,
        App,
    };
    use serde_json::{json, Value};

    use crate::{
        context::test_utils::{test_context, TestContext},
        server::configure,
    };

    fn post_validator(body: Value) -> TestRequest {
        TestRequest::post()
            .uri("/validator")
            .insert_header(ContentType::json())
            .set_payload(body.to_string())
    }

    #[actix_web::test]
    async fn validators_are_listed_by_address() {
        let ctx = test_context();
        let app = init_service(
            App::new()
                .app_data(Data::new(ctx.clone()))
                .configure(configure::<TestContext>),
        )
        .await;

        let body = json!({ "address": "B".repeat(43), "url": "http://b.example.com:42069" });
        let res = call_service(&app, post_validator(body).to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let body = json!({ "address": "A".repeat(43) });
        let res = call_service(&app, post_validator(body).to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = call_service(&app, TestRequest::get().uri("/validator").to_request()).await;
        let listed: Value = read_body_json(res).await;
        assert_eq!(
            listed,
            json!([
                { "address": "A".repeat(43), "url": null },
                { "address": "B".repeat(43), "url": "http://b.example.com:42069" },
            ])
        );
    }

    #[actix_web::test]
    async fn bad_url_is_a_bad_request() {
        let ctx = test_context();
        let app = init_service(
            App::new()
                .app_data(Data::new(ctx.clone()))
                .configure(configure::<TestContext>),
        )
        .await;

        let long = format!("http://{}.com", "v".repeat(100));
        for url in ["validator", long.as_str()] {
            let body = json!({ "address": "A".repeat(43), "url": url });
            let res = call_service(&app, post_validator(body).to_request()).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", url);
        }
    }

    #[actix_web::test]
    async fn duplicate_validator_conflicts() {
        let ctx = test_context();
        let app = init_service(
            App::new()
                .app_data(Data::new(ctx.clone()))
                .configure(configure::<TestContext>),
        )
        .await;

        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let body = json!({ "address": "A".repeat(43) });
            let res = call_service(&app, post_validator(body).to_request()).await;
            assert_eq!(res.status(), expected);
        }
    }

    #[actix_web::test]
    async fn deleted_validator_is_gone() {
        let ctx = test_context();
        let app = init_service(
            App::new()
                .app_data(Data::new(ctx.clone()))
                .configure(configure::<TestContext>),
        )
        .await;

        let address = "A".repeat(43);
        let res = call_service(&app, post_validator(json!({ "address": address })).to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let uri = format!("/validator/{}", address);
        let res = call_service(&app, TestRequest::delete().uri(&uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = call_service(&app, TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
