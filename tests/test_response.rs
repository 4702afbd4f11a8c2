use httpwire::http::headers::Headers;
use httpwire::http::response::{HandlerError, ResponseHeaders, StatusCode, default_headers};
use httpwire::http::writer::{ResponseWriter, WriterError, WriterPhase};

fn text(writer: &ResponseWriter) -> String {
    String::from_utf8(writer.as_bytes().to_vec()).unwrap()
}

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
    assert_eq!(StatusCode::Other(418).as_u16(), 418);
}

#[test]
fn test_status_code_from_u16() {
    assert_eq!(StatusCode::from(200), StatusCode::Ok);
    assert_eq!(StatusCode::from(400), StatusCode::BadRequest);
    assert_eq!(StatusCode::from(500), StatusCode::InternalServerError);
    assert_eq!(StatusCode::from(404), StatusCode::Other(404));
}

#[test]
fn test_status_lines() {
    let cases = [
        (StatusCode::Ok, "HTTP/1.1 200 OK\r\n"),
        (StatusCode::BadRequest, "HTTP/1.1 400 Bad Request\r\n"),
        (
            StatusCode::InternalServerError,
            "HTTP/1.1 500 Internal Server Error\r\n",
        ),
        (StatusCode::Other(404), "HTTP/1.1 404 \r\n"),
    ];

    for (status, expected) in cases {
        let mut writer = ResponseWriter::new();
        writer.write_status_line(status).unwrap();
        assert_eq!(text(&writer), expected);
    }
}

#[test]
fn test_empty_headers_still_end_block() {
    let mut writer = ResponseWriter::new();
    writer.write_status_line(StatusCode::Ok).unwrap();
    writer.write_headers(&Headers::new()).unwrap();

    assert_eq!(text(&writer), "HTTP/1.1 200 OK\r\n\r\n");
    assert_eq!(writer.phase(), WriterPhase::Body);
}

#[test]
fn test_plain_response() {
    let mut writer = ResponseWriter::new();
    writer.write_status_line(StatusCode::Ok).unwrap();
    writer.write_headers(&default_headers(5)).unwrap();
    writer.write_body(b"hello").unwrap();

    let out = text(&writer);
    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.contains("Content-Length: 5\r\n"));
    assert!(out.contains("Content-Type: text/plain\r\n"));
    assert!(out.contains("Connection: close\r\n"));
    assert!(out.ends_with("\r\n\r\nhello"));
}

#[test]
fn test_chunked_response_exact_bytes() {
    let mut writer = ResponseWriter::new();
    writer.write_status_line(StatusCode::Ok).unwrap();
    writer
        .write_headers(&ResponseHeaders::new().transfer_encoding("chunked").build())
        .unwrap();
    writer.write_chunked_body(b"abc").unwrap();
    writer.write_chunked_body(b"Hello, World!").unwrap();
    writer.write_chunked_body_done().unwrap();

    assert_eq!(
        text(&writer),
        "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\nd\r\nHello, World!\r\n0\r\n\r\n"
    );
    assert_eq!(writer.phase(), WriterPhase::Done);
}

#[test]
fn test_trailers_after_last_chunk() {
    let mut writer = ResponseWriter::new();
    writer.write_status_line(StatusCode::Ok).unwrap();
    writer.write_headers(&Headers::new()).unwrap();
    writer.write_chunked_body_done().unwrap();
    let n = writer.write_trailers(b"X-Content-Length: 0").unwrap();

    assert_eq!(n, 21);
    assert!(text(&writer).ends_with("0\r\n\r\nX-Content-Length: 0\r\n"));
}

#[test]
fn test_trailers_before_last_chunk_rejected() {
    let mut writer = ResponseWriter::new();
    writer.write_status_line(StatusCode::Ok).unwrap();
    writer.write_headers(&Headers::new()).unwrap();

    assert!(matches!(
        writer.write_trailers(b"X: 1"),
        Err(WriterError::InvalidPhase { .. })
    ));
}

#[test]
fn test_status_line_twice_rejected() {
    let mut writer = ResponseWriter::new();
    writer.write_status_line(StatusCode::Ok).unwrap();

    assert!(writer.write_status_line(StatusCode::Ok).is_err());
}

#[test]
fn test_response_headers_builder() {
    let headers = ResponseHeaders::new()
        .content_length(12)
        .content_type("text/html")
        .connection("keep-alive")
        .trailer(&["X-Content-SHA256", "X-Content-Length"])
        .header("X-Custom", "value")
        .build();

    assert_eq!(headers.get("Content-Length"), Some("12"));
    assert_eq!(headers.get("content-type"), Some("text/html"));
    assert_eq!(headers.get("Connection"), Some("keep-alive"));
    assert_eq!(
        headers.get("Trailer"),
        Some("X-Content-SHA256, X-Content-Length")
    );
    assert_eq!(headers.get("x-custom"), Some("value"));
}

#[test]
fn test_connection_defaults_to_close() {
    let headers = ResponseHeaders::new().connection("").build();
    assert_eq!(headers.get("connection"), Some("close"));
}

#[test]
fn test_handler_error_write() {
    let err = HandlerError::bad_request("nope");
    let mut writer = ResponseWriter::new();
    err.write(&mut writer).unwrap();

    let out = text(&writer);
    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(out.contains("Content-Length: 4\r\n"));
    assert!(out.ends_with("\r\n\r\nnope"));
}

#[test]
fn test_writer_error_becomes_internal_error() {
    let mut writer = ResponseWriter::new();
    let err: HandlerError = writer.write_body(b"x").unwrap_err().into();

    assert_eq!(err.status, StatusCode::InternalServerError);
}
