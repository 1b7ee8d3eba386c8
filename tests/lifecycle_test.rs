//! Request lifecycle tests driven through `Service::handle`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use axum::http::{header, Method, StatusCode};
use waypoint::pipeline::error_pages::{INTERNAL_ERROR, NOT_FOUND};
use waypoint::{halt, halt_status, Interrupt, RawRequest, Routable, Service};

mod common;
use common::{get, send, text};

#[derive(Debug, thiserror::Error)]
#[error("base failure")]
struct BaseError;

#[derive(Debug, thiserror::Error)]
#[error("sub failure")]
struct SubError(#[source] BaseError);

#[test]
fn test_param_and_splat_end_to_end() {
    let service = Service::new();
    service
        .get("/param/:param", |req, _| Ok(format!("echo: {}", req.param("param").unwrap_or_default())))
        .unwrap();
    service
        .get("/paramandwild/:param/stuff/*", |req, _| {
            Ok(format!("{} {}", req.param(":param").unwrap_or_default(), req.splat().join(",")))
        })
        .unwrap();

    assert_eq!(text(&get(&service, "/param/shizzy")), "echo: shizzy");
    assert_eq!(text(&get(&service, "/paramandwild/x/stuff/y/z")), "x y/z");
}

#[test]
fn test_params_are_percent_decoded_and_keep_case() {
    let service = Service::new();
    service
        .get("/param/:param", |req, _| Ok(req.param("PARAM").unwrap_or_default().to_string()))
        .unwrap();

    assert_eq!(text(&get(&service, "/param/Hello%20World")), "Hello World");
    assert_eq!(text(&get(&service, "/param/a+b")), "a+b");
    assert_eq!(text(&get(&service, "/param/%E6%97%A5%E6%9C%AC")), "日本");
}

#[test]
fn test_halt_in_before_skips_route_and_after_but_not_after_always() {
    let service = Service::new();
    let route_calls = Arc::new(AtomicUsize::new(0));
    let after_calls = Arc::new(AtomicUsize::new(0));

    service
        .before("/protected/*", |_, _| Err(halt(StatusCode::UNAUTHORIZED, "Go Away!")))
        .unwrap();
    let calls = route_calls.clone();
    service
        .get("/protected/resource", move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("secret")
        })
        .unwrap();
    let calls = after_calls.clone();
    service
        .after("/protected/*", move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
    service
        .after_always("/protected/*", |_, res| {
            let seen = res.body().get().cloned().unwrap_or_default().into_text();
            res.set_body(format!("{} (seen by after-always)", seen));
            Ok(())
        })
        .unwrap();

    let finished = get(&service, "/protected/resource");
    assert_eq!(finished.status, StatusCode::UNAUTHORIZED);
    assert_eq!(text(&finished), "Go Away! (seen by after-always)");
    assert_eq!(route_calls.load(Ordering::SeqCst), 0);
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_halt_without_body_gives_empty_body() {
    let service = Service::new();
    service.before_all(|_, _| Err(halt_status(StatusCode::FORBIDDEN))).unwrap();
    service.get("/x", |_, _| Ok("never")).unwrap();

    let finished = get(&service, "/x");
    assert_eq!(finished.status, StatusCode::FORBIDDEN);
    assert_eq!(text(&finished), "");
}

#[test]
fn test_filters_run_in_registration_order_and_after_overwrites() {
    let service = Service::new();
    service
        .before_all(|req, _| {
            req.set_attribute(vec!["before-1".to_string()]);
            Ok(())
        })
        .unwrap();
    service
        .before("/order", |req, _| {
            let mut trail: Vec<String> = req.attribute::<Vec<String>>().cloned().unwrap_or_default();
            trail.push("before-2".into());
            req.set_attribute(trail);
            Ok(())
        })
        .unwrap();
    service
        .get("/order", |req, _| {
            Ok(req.attribute::<Vec<String>>().cloned().unwrap_or_default().join(">"))
        })
        .unwrap();
    service
        .after("/order", |_, res| {
            let body = res.body().get().cloned().unwrap_or_default().into_text();
            res.set_body(format!("{}>after", body));
            Ok(())
        })
        .unwrap();

    assert_eq!(text(&get(&service, "/order")), "before-1>before-2>after");
}

#[test]
fn test_body_set_in_before_wins_over_route_result() {
    let service = Service::new();
    service
        .before("/preset", |_, res| {
            res.set_body("from before");
            Ok(())
        })
        .unwrap();
    service.get("/preset", |_, _| Ok("from route")).unwrap();

    assert_eq!(text(&get(&service, "/preset")), "from before");
}

#[test]
fn test_base_error_mapping_handles_wrapping_error() {
    let service = Service::new();
    service.exception::<BaseError, _>(|err, _, res| {
        res.set_status(StatusCode::IM_A_TEAPOT);
        res.set_body(format!("handled: {}", err));
        Ok(())
    });
    service.get("/sub", |_, _| -> Result<String, Interrupt> { Err(SubError(BaseError).into()) }).unwrap();

    let finished = get(&service, "/sub");
    assert_eq!(finished.status, StatusCode::IM_A_TEAPOT);
    assert_eq!(text(&finished), "handled: base failure");
}

#[test]
fn test_mapping_without_body_gives_empty_body_not_404() {
    let service = Service::new();
    service.exception::<BaseError, _>(|_, _, res| {
        res.set_status(StatusCode::CONFLICT);
        Ok(())
    });
    service.get("/quiet", |_, _| -> Result<String, Interrupt> { Err(BaseError.into()) }).unwrap();

    let finished = get(&service, "/quiet");
    assert_eq!(finished.status, StatusCode::CONFLICT);
    assert_eq!(text(&finished), "");
}

#[test]
fn test_unmapped_error_gives_generic_500() {
    let service = Service::new();
    service.get("/boom", |_, _| -> Result<String, Interrupt> { Err(Interrupt::failure("boom")) }).unwrap();

    let finished = get(&service, "/boom");
    assert_eq!(finished.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&finished), INTERNAL_ERROR);
}

#[test]
fn test_custom_500_page() {
    let service = Service::new();
    service.internal_server_error("<h1>Custom 500</h1>");
    service.get("/boom", |_, _| -> Result<String, Interrupt> { Err(Interrupt::failure("boom")) }).unwrap();

    let finished = get(&service, "/boom");
    assert_eq!(finished.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&finished), "<h1>Custom 500</h1>");
}

#[test]
fn test_failing_custom_500_route_falls_back_to_generic() {
    let service = Service::new();
    service.internal_server_error_route(|_, _| -> Result<String, Interrupt> {
        Err(Interrupt::failure("error page broke"))
    });
    service.get("/boom", |_, _| -> Result<String, Interrupt> { Err(Interrupt::failure("boom")) }).unwrap();

    let finished = get(&service, "/boom");
    assert_eq!(finished.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&finished), INTERNAL_ERROR);
}

#[test]
fn test_custom_500_route_never_leaks_failed_route_body() {
    let service = Service::new();
    service.get("/account", |_, _| Ok("account=42;balance=1000")).unwrap();
    service
        .after("/account", |_, _| Err(Interrupt::failure("audit failed")))
        .unwrap();
    service.internal_server_error_route(|_, res| {
        res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    });

    let finished = get(&service, "/account");
    assert_eq!(finished.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&finished), INTERNAL_ERROR);
}

#[test]
fn test_failing_mapping_gives_fixed_500() {
    let service = Service::new();
    service.internal_server_error("custom page is not used here");
    service.exception::<BaseError, _>(|_, _, _| Err(Interrupt::failure("handler broke")));
    service.get("/double", |_, _| -> Result<String, Interrupt> { Err(BaseError.into()) }).unwrap();

    let finished = get(&service, "/double");
    assert_eq!(finished.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&finished), INTERNAL_ERROR);
}

#[test]
fn test_mapping_may_halt() {
    let service = Service::new();
    service.exception::<BaseError, _>(|_, _, _| Err(halt(StatusCode::BAD_REQUEST, "bad input")));
    service.get("/halting", |_, _| -> Result<String, Interrupt> { Err(BaseError.into()) }).unwrap();

    let finished = get(&service, "/halting");
    assert_eq!(finished.status, StatusCode::BAD_REQUEST);
    assert_eq!(text(&finished), "bad input");
}

#[test]
fn test_not_found_generic_and_custom() {
    let service = Service::new();
    let finished = get(&service, "/nothing");
    assert_eq!(finished.status, StatusCode::NOT_FOUND);
    assert_eq!(text(&finished), NOT_FOUND);

    service.not_found_route(|req, _| Ok(format!("no page at {}", req.uri())));
    let finished = get(&service, "/nothing");
    assert_eq!(finished.status, StatusCode::NOT_FOUND);
    assert_eq!(text(&finished), "no page at /nothing");
}

#[test]
fn test_after_always_sees_unset_body_for_unhandled_request() {
    let service = Service::new();
    service
        .after_always_all(|_, res| {
            let state = if res.body().is_set() { "set" } else { "unset" };
            res.header("x-body-state", state)?;
            Ok(())
        })
        .unwrap();

    let finished = get(&service, "/missing");
    assert_eq!(finished.status, StatusCode::NOT_FOUND);
    assert_eq!(finished.headers["x-body-state"], "unset");
}

#[test]
fn test_errors_in_after_always_are_resolved() {
    let service = Service::new();
    service.get("/ok", |_, _| Ok("fine")).unwrap();
    service
        .after_always("/ok", |_, _| Err(Interrupt::failure("cleanup failed")))
        .unwrap();

    let finished = get(&service, "/ok");
    assert_eq!(finished.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&finished), INTERNAL_ERROR);
}

#[test]
fn test_unmap_then_restore() {
    let service = Service::new();
    service.get("/tobeunmapped", |_, _| Ok("get")).unwrap();
    service.post("/tobeunmapped", |_, _| Ok("post")).unwrap();

    assert!(service.unmap("/tobeunmapped"));
    assert_eq!(get(&service, "/tobeunmapped").status, StatusCode::NOT_FOUND);
    assert_eq!(send(&service, Method::POST, "/tobeunmapped").status, StatusCode::NOT_FOUND);

    service.get("/tobeunmapped", |_, _| Ok("back")).unwrap();
    assert_eq!(text(&get(&service, "/tobeunmapped")), "back");
}

#[test]
fn test_accept_type_negotiation() {
    let service = Service::new();
    service
        .on(waypoint::HttpMethod::Get, "/hi", "application/json", |_, res| {
            res.set_content_type("application/json")?;
            Ok("{\"hello\":\"world\"}")
        })
        .unwrap();
    service.get("/hi", |_, _| Ok("Hello World!")).unwrap();

    let json = service.handle(RawRequest::new(Method::GET, "/hi").header("Accept", "application/json"));
    assert_eq!(text(&json), "{\"hello\":\"world\"}");
    assert_eq!(json.headers[header::CONTENT_TYPE], "application/json");

    let html = service.handle(RawRequest::new(Method::GET, "/hi").header("Accept", "text/html"));
    assert_eq!(text(&html), "Hello World!");
}

#[test]
fn test_no_acceptable_route_is_not_found() {
    let service = Service::new();
    service
        .on(waypoint::HttpMethod::Get, "/data", "application/json", |_, _| Ok("{}"))
        .unwrap();

    let finished = service.handle(RawRequest::new(Method::GET, "/data").header("Accept", "text/plain"));
    assert_eq!(finished.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_redirect_discards_route_result() {
    let service = Service::new();
    service
        .get("/old", |_, res| {
            res.redirect("/new")?;
            Ok("ignored")
        })
        .unwrap();

    let finished = get(&service, "/old");
    assert_eq!(finished.status, StatusCode::FOUND);
    assert_eq!(finished.headers[header::LOCATION], "/new");
    assert_eq!(text(&finished), "");
}

#[test]
fn test_redirect_from_before_filter() {
    let service = Service::new();
    service
        .before("/secure", |_, res| {
            res.redirect_with("/login", StatusCode::SEE_OTHER)?;
            Err(halt_status(StatusCode::SEE_OTHER))
        })
        .unwrap();

    let finished = get(&service, "/secure");
    assert_eq!(finished.status, StatusCode::SEE_OTHER);
    assert_eq!(finished.headers[header::LOCATION], "/login");
}

#[test]
fn test_head_falls_back_to_get_route() {
    let service = Service::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    service
        .get("/page", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("body")
        })
        .unwrap();

    let finished = send(&service, Method::HEAD, "/page");
    assert_eq!(finished.status, StatusCode::OK);
    assert_eq!(text(&finished), "");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(send(&service, Method::HEAD, "/other").status, StatusCode::NOT_FOUND);
}

#[test]
fn test_trailing_slash_is_significant() {
    let service = Service::new();
    service.get("/slash/", |_, _| Ok("with")).unwrap();

    assert_eq!(text(&get(&service, "/slash/")), "with");
    assert_eq!(get(&service, "/slash").status, StatusCode::NOT_FOUND);
}

#[test]
fn test_binary_body() {
    let service = Service::new();
    service.get("/bytes", |_, _| Ok(b"\x00\x01\x02".to_vec())).unwrap();

    let finished = get(&service, "/bytes");
    assert_eq!(finished.body.into_bytes().as_ref(), &[0u8, 1, 2]);
}

#[test]
fn test_concurrent_requests_while_unmapping() {
    let service = Service::new();
    service.get("/stable", |_, _| Ok("stable")).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    assert_eq!(text(&get(&service, "/stable")), "stable");
                }
            })
        })
        .collect();

    for i in 0..100 {
        let path = format!("/temp/{}", i);
        service.get(&path, |_, _| Ok("temp")).unwrap();
        assert!(service.unmap(&path));
    }

    for worker in workers {
        worker.join().unwrap();
    }
}
