mod context;

pub use context::{
    make_span_with_request_context, request_context_middleware, RequestContext, RequiredViewer,
    Viewer, REQUEST_ID_HEADER, VIEWER_ID_HEADER,
};
