mod detection_props;
mod reconcile_props;
