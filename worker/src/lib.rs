use serde_json::Value;
use worker::*;

mod envelope;

use envelope::{
    CORS_HEADERS, PREFLIGHT_STATUS, Route, WEBHOOK_VAR, describe_records, is_success, route_for,
    upstream_status_message,
};

const PROXY_PATH: &str = "/api/proxy";

#[event(fetch)]
async fn main(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    let router = Router::new();

    // Every method lands on the same handler; anything but OPTIONS is a fetch.
    router.on_async(PROXY_PATH, handle_proxy).run(req, env).await
}

fn cors_headers() -> Headers {
    let headers = Headers::new();
    for (name, value) in CORS_HEADERS {
        let _ = headers.set(name, value);
    }
    headers
}

fn with_cors(mut response: Response) -> Result<Response> {
    let cors = cors_headers();
    for (key, value) in cors.entries() {
        response.headers_mut().set(&key, &value)?;
    }
    Ok(response)
}

fn json_response(body: &Value, status: u16) -> Result<Response> {
    with_cors(Response::from_json(body)?.with_status(status))
}

fn webhook_url(env: &Env) -> Option<String> {
    env.secret(WEBHOOK_VAR)
        .map(|v| v.to_string())
        .or_else(|_| env.var(WEBHOOK_VAR).map(|v| v.to_string()))
        .ok()
        .filter(|url| !url.trim().is_empty())
}

async fn handle_proxy(req: Request, ctx: RouteContext<()>) -> Result<Response> {
    if route_for(&req.method().to_string()) == Route::Preflight {
        return handle_cors_preflight();
    }

    let Some(url) = webhook_url(&ctx.env) else {
        return json_response(&envelope::config_missing(), 500);
    };

    console_log!("Proxying request to: {}", url);

    match fetch_upstream(&url).await {
        Ok(data) => {
            console_log!("Received data records: {}", describe_records(&data));
            json_response(&data, 200)
        }
        Err(err) => {
            console_error!("Proxy error: {}", err);
            json_response(&envelope::fetch_failed(&err.to_string()), 500)
        }
    }
}

async fn fetch_upstream(url: &str) -> Result<Value> {
    let headers = Headers::new();
    headers.set("Accept", "application/json")?;

    let mut init = RequestInit::new();
    init.with_method(Method::Get).with_headers(headers);

    let request = Request::new_with_init(url, &init)?;
    let mut response = Fetch::Request(request).send().await?;

    let status = response.status_code();
    if !is_success(status) {
        return Err(Error::RustError(upstream_status_message(status)));
    }

    response.json::<Value>().await
}

fn handle_cors_preflight() -> Result<Response> {
    let mut response = Response::empty()?.with_status(PREFLIGHT_STATUS);
    *response.headers_mut() = cors_headers();
    Ok(response)
}
