//! Embedded viewer page.
//!
//! Opens the push channel and renders incoming snapshots into a table,
//! newest first. Display cap matches the server-side retention window.

use axum::response::Html;

/// Serve the viewer page.
///
/// GET /
pub async fn viewer_page() -> Html<&'static str> {
    Html(VIEWER_PAGE)
}

const VIEWER_PAGE: &str = r##"<!DOCTYPE html>
<html>
<head>
    <title>Chatroom</title>
    <link rel="stylesheet" type="text/css" href="https://cdn.datatables.net/1.13.6/css/jquery.dataTables.min.css"/>
    <script src="https://code.jquery.com/jquery-3.7.0.min.js"></script>
    <script src="https://cdn.datatables.net/1.13.6/js/jquery.dataTables.min.js"></script>
    <style>
        body { font-family: Arial, sans-serif; margin: 8px; padding: 0; }
        table.dataTable thead th { font-weight: bold; border-bottom: 2px solid #ddd; }
        table.dataTable { border-bottom: 2px solid #ddd; }
        .level-0 { color: #000000 !important; }
        .level-1 { color: #CD7F32 !important; }
        .level-2 { color: #FFA500 !important; }
        .level-3 { color: #0000FF !important; }
        .level-4 { color: #32CD32 !important; }
        .level-5 { color: #FF00FF !important; }
        th, td { vertical-align: top; }
        th:nth-child(1), td:nth-child(1) { width: 130px; white-space: nowrap; }
        th:nth-child(2), td:nth-child(2) { width: 120px; white-space: nowrap; }
        th:nth-child(3), td:nth-child(3) { width: auto; word-break: break-word; white-space: pre-line; }
        .page-header { display: flex; align-items: center; gap: 20px; margin-left: 10px; }
        .page-header span { color: red; }
    </style>
</head>
<body>
<div class="page-header">
    <h2>Chatroom</h2>
    <span>* last 1000 messages</span>
</div>
<table id="history" class="display" style="width:100%">
    <thead>
        <tr>
            <th>Time</th>
            <th>Username</th>
            <th>Message</th>
        </tr>
    </thead>
    <tbody></tbody>
</table>
<script>
    var table = $('#history').DataTable({
        "order": [[0, "desc"]],
        "paging": false,
        "info": false,
        "searching": true,
        "language": {
            "emptyTable": "No messages yet"
        }
    });

    function updateTable(history) {
        table.clear();
        history.forEach(function(chat) {
            var level = chat.level || 0;
            table.row.add([
                chat.timestamp_wib || "",
                '<span class="level-' + level + '">' + (chat.username || "") + '</span>',
                '<span class="level-' + level + '">' + (chat.content || "") + '</span>'
            ]);
        });
        table.draw();
    }

    function connectWS() {
        var ws = new WebSocket((location.protocol === "https:" ? "wss://" : "ws://") + location.host + "/ws");
        ws.onmessage = function(event) {
            var data = JSON.parse(event.data);
            if (!data.ping) updateTable(data.history);
        };
        ws.onclose = function() {
            setTimeout(connectWS, 1000);
        };
    }
    connectWS();
</script>
</body>
</html>
"##;
